// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SQLite-backed persistence implementation.
//!
//! Used for local runs and tests. Timestamps are stored as RFC 3339 text.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::migrations;
use crate::models::{
    EvidenceUpload, SecondaryForm, SecondaryFormStatusUpdate, Submission, SubmissionKind,
    SubmissionStatusUpdate,
};

use super::{EvidenceUploadRow, SecondaryFormRow, SubmissionRow, SubmissionStore};

/// SQLite-backed store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create and initialize a store backed by a database file.
    ///
    /// Creates parent directories and the file if needed, then runs all
    /// migrations.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::InvalidRecord(format!(
                    "Failed to create directory {:?}: {}",
                    parent, e
                ))
            })?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        migrations::run_sqlite(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a migrated in-memory store.
    ///
    /// The pool is pinned to a single connection; every connection to
    /// `sqlite::memory:` would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        migrations::run_sqlite(&pool).await?;

        Ok(Self { pool })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SubmissionStore for SqliteStore {
    async fn insert_submission(&self, submission: &Submission) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions (id, kind, status, metadata, metadata_updated_at, delete_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
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
            VALUES (?, ?, ?, ?, ?)
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
            VALUES (?, ?, ?, ?, ?, ?, ?)
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
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, kind, status, metadata, metadata_updated_at, delete_date, created_at
            FROM submissions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Submission::try_from).transpose()
    }

    async fn list_open_submissions(&self, kind: SubmissionKind) -> Result<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, kind, status, metadata, metadata_updated_at, delete_date, created_at
            FROM submissions
            WHERE kind = ? AND delete_date IS NULL
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Submission::try_from).collect()
    }

    async fn list_evidence_uploads(&self, submission_id: &str) -> Result<Vec<EvidenceUpload>> {
        let rows = sqlx::query_as::<_, EvidenceUploadRow>(
            r#"
            SELECT id, submission_id, status, detail, created_at
            FROM evidence_uploads
            WHERE submission_id = ?
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
            WHERE submission_id = ?
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
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET status = ?, metadata = ?, metadata_updated_at = ?, delete_date = ?
            WHERE id = ?
            "#,
        )
        .bind(update.status.as_str())
        .bind(&update.metadata)
        .bind(update.metadata_updated_at)
        .bind(update.delete_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::SubmissionNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn update_secondary_form_status(
        &self,
        id: &str,
        update: &SecondaryFormStatusUpdate,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE secondary_forms
            SET status = ?, status_updated_at = ?, delete_date = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.status)
        .bind(update.status_updated_at)
        .bind(update.delete_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::SecondaryFormNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn get_feature_flag(&self, name: &str) -> Result<Option<bool>> {
        let enabled =
            sqlx::query_scalar::<_, bool>("SELECT enabled FROM feature_flags WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(enabled)
    }

    async fn set_feature_flag(&self, name: &str, enabled: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feature_flags (name, enabled, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (name) DO UPDATE SET enabled = excluded.enabled, updated_at = excluded.updated_at
            "#,
        )
        .bind(name)
        .bind(enabled)
        .bind(Utc::now())
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
            VALUES (?, ?, ?, ?)
            ON CONFLICT (name) DO UPDATE
                SET holder = excluded.holder,
                    acquired_at = excluded.acquired_at,
                    expires_at = excluded.expires_at
                WHERE job_leases.expires_at <= excluded.acquired_at
                   OR job_leases.holder = excluded.holder
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
        let result = sqlx::query("DELETE FROM job_leases WHERE name = ? AND holder = ?")
            .bind(name)
            .bind(holder)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
