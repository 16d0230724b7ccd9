// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL-backed persistence implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::models::{
    EvidenceUpload, SecondaryForm, SecondaryFormStatusUpdate, Submission, SubmissionKind,
    SubmissionStatusUpdate,
};

use super::{EvidenceUploadRow, SecondaryFormRow, SubmissionRow, SubmissionStore};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new Postgres-backed store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ============================================================================
// Submission Operations
// ============================================================================

/// Get a submission by id.
pub async fn get_submission(pool: &PgPool, id: &str) -> Result<Option<Submission>> {
    let row = sqlx::query_as::<_, SubmissionRow>(
        r#"
        SELECT id, kind, status, metadata, metadata_updated_at, delete_date, created_at
        FROM submissions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Submission::try_from).transpose()
}

/// List open submissions of a kind in creation order.
pub async fn list_open_submissions(pool: &PgPool, kind: SubmissionKind) -> Result<Vec<Submission>> {
    let rows = sqlx::query_as::<_, SubmissionRow>(
        r#"
        SELECT id, kind, status, metadata, metadata_updated_at, delete_date, created_at
        FROM submissions
        WHERE kind = $1 AND delete_date IS NULL
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(kind.as_str())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Submission::try_from).collect()
}

/// Write a polled status onto a submission row.
pub async fn update_submission_status(
    pool: &PgPool,
    id: &str,
    update: &SubmissionStatusUpdate,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE submissions
        SET status = $2, metadata = $3, metadata_updated_at = $4, delete_date = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(update.status.as_str())
    .bind(&update.metadata)
    .bind(update.metadata_updated_at)
    .bind(update.delete_date)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::SubmissionNotFound(id.to_string()));
    }

    Ok(())
}

#[async_trait]
impl SubmissionStore for PostgresStore {
    async fn insert_submission(&self, submission: &Submission) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions (id, kind, status, metadata, metadata_updated_at, delete_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&submission.id)
        .bind(submission.kind.as_str())
        .bind(submission.status.map(|s| s.as_str()))
        .bind(&submission.metadata)
        .bind(submission.metadata_updated_at)
        .bind(submission.delete_date)
        .bind(submission.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_evidence_upload(&self, upload: &EvidenceUpload) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO evidence_uploads (id, submission_id, status, detail, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&upload.id)
        .bind(&upload.submission_id)
        .bind(&upload.status)
        .bind(&upload.detail)
        .bind(upload.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_secondary_form(&self, form: &SecondaryForm) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO secondary_forms (id, submission_id, form_id, status, status_updated_at, delete_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&form.id)
        .bind(&form.submission_id)
        .bind(&form.form_id)
        .bind(&form.status)
        .bind(form.status_updated_at)
        .bind(form.delete_date)
        .bind(form.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_submission(&self, id: &str) -> Result<Option<Submission>> {
        get_submission(&self.pool, id).await
    }

    async fn list_open_submissions(&self, kind: SubmissionKind) -> Result<Vec<Submission>> {
        list_open_submissions(&self.pool, kind).await
    }

    async fn list_evidence_uploads(&self, submission_id: &str) -> Result<Vec<EvidenceUpload>> {
        let rows = sqlx::query_as::<_, EvidenceUploadRow>(
            r#"
            SELECT id, submission_id, status, detail, created_at
            FROM evidence_uploads
            WHERE submission_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EvidenceUpload::from).collect())
    }

    async fn list_secondary_forms(&self, submission_id: &str) -> Result<Vec<SecondaryForm>> {
        let rows = sqlx::query_as::<_, SecondaryFormRow>(
            r#"
            SELECT id, submission_id, form_id, status, status_updated_at, delete_date, created_at
            FROM secondary_forms
            WHERE submission_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SecondaryForm::from).collect())
    }

    async fn update_submission_status(
        &self,
        id: &str,
        update: &SubmissionStatusUpdate,
    ) -> Result<()> {
        update_submission_status(&self.pool, id, update).await
    }

    async fn update_secondary_form_status(
        &self,
        id: &str,
        update: &SecondaryFormStatusUpdate,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE secondary_forms
            SET status = $2, status_updated_at = $3, delete_date = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.status)
        .bind(update.status_updated_at)
        .bind(update.delete_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::SecondaryFormNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn get_feature_flag(&self, name: &str) -> Result<Option<bool>> {
        let enabled =
            sqlx::query_scalar::<_, bool>("SELECT enabled FROM feature_flags WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(enabled)
    }

    async fn set_feature_flag(&self, name: &str, enabled: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feature_flags (name, enabled, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (name) DO UPDATE SET enabled = EXCLUDED.enabled, updated_at = NOW()
            "#,
        )
        .bind(name)
        .bind(enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO job_leases (name, holder, acquired_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE
                SET holder = EXCLUDED.holder,
                    acquired_at = EXCLUDED.acquired_at,
                    expires_at = EXCLUDED.expires_at
                WHERE job_leases.expires_at <= EXCLUDED.acquired_at
                   OR job_leases.holder = EXCLUDED.holder
            "#,
        )
        .bind(name)
        .bind(holder)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        let acquired = result.rows_affected() == 1;
        debug!(lease = %name, holder = %holder, acquired, "Lease acquisition attempted");
        Ok(acquired)
    }

    async fn release_lease(&self, name: &str, holder: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM job_leases WHERE name = $1 AND holder = $2")
            .bind(name)
            .bind(holder)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
