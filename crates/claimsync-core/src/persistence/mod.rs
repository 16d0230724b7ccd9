// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Persistence interfaces and backends for claimsync-core.
//!
//! This module defines the persistence abstraction and backend implementations.

pub mod postgres;
pub mod sqlite;

pub use self::postgres::PostgresStore;
pub use self::sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Result, StoreError};
use crate::models::{
    EvidenceUpload, SecondaryForm, SecondaryFormStatusUpdate, Submission, SubmissionKind,
    SubmissionStatusUpdate,
};

/// Submission row as stored (kind and status as text).
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SubmissionRow {
    pub id: String,
    pub kind: String,
    pub status: Option<String>,
    pub metadata: Option<String>,
    pub metadata_updated_at: Option<DateTime<Utc>>,
    pub delete_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> Result<Self> {
        Ok(Submission {
            kind: row.kind.parse()?,
            status: row.status.as_deref().map(str::parse).transpose()?,
            id: row.id,
            metadata: row.metadata,
            metadata_updated_at: row.metadata_updated_at,
            delete_date: row.delete_date,
            created_at: row.created_at,
        })
    }
}

/// Evidence upload row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct EvidenceUploadRow {
    pub id: String,
    pub submission_id: String,
    pub status: Option<String>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<EvidenceUploadRow> for EvidenceUpload {
    fn from(row: EvidenceUploadRow) -> Self {
        EvidenceUpload {
            id: row.id,
            submission_id: row.submission_id,
            status: row.status,
            detail: row.detail,
            created_at: row.created_at,
        }
    }
}

/// Secondary form row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SecondaryFormRow {
    pub id: String,
    pub submission_id: String,
    pub form_id: String,
    pub status: Option<String>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub delete_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<SecondaryFormRow> for SecondaryForm {
    fn from(row: SecondaryFormRow) -> Self {
        SecondaryForm {
            id: row.id,
            submission_id: row.submission_id,
            form_id: row.form_id,
            status: row.status,
            status_updated_at: row.status_updated_at,
            delete_date: row.delete_date,
            created_at: row.created_at,
        }
    }
}

/// Persistence interface used by the reconciler and its collaborators.
///
/// Every update is a single-row statement; no operation spans rows in a
/// transaction.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Record a submission. Used by intake and test fixtures.
    async fn insert_submission(&self, submission: &Submission) -> Result<()>;

    /// Record an evidence upload for an existing submission.
    async fn insert_evidence_upload(&self, upload: &EvidenceUpload) -> Result<()>;

    /// Record a secondary form for an existing submission.
    async fn insert_secondary_form(&self, form: &SecondaryForm) -> Result<()>;

    /// Get a submission by id.
    async fn get_submission(&self, id: &str) -> Result<Option<Submission>>;

    /// All submissions of `kind` without a retention timestamp, oldest first.
    ///
    /// Ties on `created_at` are broken by `id` so the order is deterministic.
    async fn list_open_submissions(&self, kind: SubmissionKind) -> Result<Vec<Submission>>;

    /// Evidence uploads of a submission, oldest first.
    async fn list_evidence_uploads(&self, submission_id: &str) -> Result<Vec<EvidenceUpload>>;

    /// Secondary forms of a submission, oldest first.
    async fn list_secondary_forms(&self, submission_id: &str) -> Result<Vec<SecondaryForm>>;

    /// Write status, metadata and (optionally) the retention timestamp.
    ///
    /// Returns [`StoreError::SubmissionNotFound`] when no row matched.
    async fn update_submission_status(
        &self,
        id: &str,
        update: &SubmissionStatusUpdate,
    ) -> Result<()>;

    /// Write a secondary form's status and retention timestamp.
    ///
    /// Returns [`StoreError::SecondaryFormNotFound`] when no row matched.
    async fn update_secondary_form_status(
        &self,
        id: &str,
        update: &SecondaryFormStatusUpdate,
    ) -> Result<()>;

    /// Read a persisted feature flag. `None` when the flag was never set.
    async fn get_feature_flag(&self, name: &str) -> Result<Option<bool>>;

    /// Enable or disable a persisted feature flag.
    async fn set_feature_flag(&self, name: &str, enabled: bool) -> Result<()>;

    /// Take the named lease until `expires_at`.
    ///
    /// Succeeds when the lease is free, expired at `now`, or already held by
    /// `holder` (which extends it). Returns whether the lease is now held.
    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Drop the named lease if `holder` still owns it.
    async fn release_lease(&self, name: &str, holder: &str) -> Result<bool>;
}
