// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for claimsync-core.

use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed.
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Submission was not found.
    #[error("Submission not found: {0}")]
    SubmissionNotFound(String),

    /// Secondary form was not found.
    #[error("Secondary form not found: {0}")]
    SecondaryFormNotFound(String),

    /// A persisted row could not be mapped to a record.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type using StoreError.
pub type Result<T> = std::result::Result<T, StoreError>;
