// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! claimsync core - submission records and persistence.
//!
//! This crate owns the data model that the status reconciler mutates:
//! submissions, the evidence uploads attached to them, and the secondary
//! forms submitted alongside them. It also owns the schema (embedded sqlx
//! migrations) and the [`persistence::SubmissionStore`] abstraction with
//! PostgreSQL and SQLite backends.
//!
//! # Submission Lifecycle
//!
//! ```text
//!   intake (out of scope)
//!          │
//!          ▼
//!   ┌──────────────┐   poll, metadata refreshed
//!   │  UNRESOLVED  │◄───────────────────────┐
//!   │ delete_date  │────────────────────────┘
//!   │   = NULL     │
//!   └──────┬───────┘
//!          │ own status complete
//!          │ + every upload in vbms
//!          │ + every secondary form resolved
//!          ▼
//!   ┌──────────────┐
//!   │   RESOLVED   │  delete_date = now + retention (terminal)
//!   └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`error`]: Store error types
//! - [`migrations`]: Embedded PostgreSQL and SQLite migrations
//! - [`models`]: Submission, evidence upload and secondary form records
//! - [`persistence`]: The store trait and its backends

#![deny(missing_docs)]

/// Store error types.
pub mod error;

/// Embedded database migrations.
pub mod migrations;

/// Submission, evidence upload and secondary form records.
pub mod models;

/// Persistence trait and PostgreSQL/SQLite backends.
pub mod persistence;

pub use error::StoreError;
pub use models::{
    EvidenceUpload, SecondaryForm, SecondaryFormStatusUpdate, Submission, SubmissionKind,
    SubmissionStatus, SubmissionStatusUpdate,
};
pub use persistence::SubmissionStore;
