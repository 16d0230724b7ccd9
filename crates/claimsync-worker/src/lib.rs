// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! claimsync worker - decision-review submission status reconciliation.
//!
//! Periodically polls the Lighthouse Decision Reviews API for every open
//! submission, refreshes its stored status metadata and sets the retention
//! timestamp once the submission, all of its evidence uploads and all of its
//! secondary forms have succeeded.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 ReconcilerWorker (one per kind)              │
//! │  lease ──► flag snapshot ──► run_once ──► release            │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!              ┌─────────────────┼──────────────────┐
//!              ▼                 ▼                  ▼
//!   ┌──────────────────┐ ┌──────────────┐ ┌──────────────────┐
//!   │ ClaimsTracking   │ │ Submission   │ │  MetricsSink     │
//!   │ Client           │ │ Store        │ │  (counters)      │
//!   │ (Lighthouse)     │ │ (PG/SQLite)  │ │                  │
//!   └──────────────────┘ └──────────────┘ └──────────────────┘
//! ```
//!
//! # Submission Kinds
//!
//! | Kind | Evidence uploads | Secondary forms | Service tag |
//! |------|------------------|-----------------|-------------|
//! | `supplemental_claim` | yes | yes (21-4142) | `supplemental-claims` |
//! | `higher_level_review` | no | no | `higher-level-review` |
//! | `notice_of_disagreement` | yes | no | `board-appeal` |
//!
//! # Configuration
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `CLAIMSYNC_DATABASE_URL` | Yes | - | PostgreSQL connection string |
//! | `CLAIMSYNC_LIGHTHOUSE_BASE_URL` | No | sandbox | Decision Reviews API base URL |
//! | `CLAIMSYNC_LIGHTHOUSE_API_KEY` | Yes | - | API key |
//! | `CLAIMSYNC_HTTP_TIMEOUT_SECS` | No | `30` | Upstream request timeout |
//! | `CLAIMSYNC_KINDS` | No | all | Comma-separated kinds to reconcile |
//! | `CLAIMSYNC_POLL_INTERVAL_SECS` | No | `3600` | Seconds between passes |
//! | `CLAIMSYNC_LEASE_TTL_SECS` | No | `1800` | Run lease duration |
//! | `CLAIMSYNC_RUN_ON_START` | No | `true` | Run a pass at startup |
//! | `CLAIMSYNC_LOG_FORMAT` | No | text | `json` for JSON log lines |
//! | `CLAIMSYNC_FLAG_<NAME>` | No | - | Override a stored feature flag |
//!
//! # Modules
//!
//! - [`client`]: Claims-tracking client trait, Lighthouse and mock clients
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types
//! - [`flags`]: Feature flags and per-invocation snapshots
//! - [`kinds`]: Per-kind reconciliation profiles
//! - [`lease`]: Run leases
//! - [`metrics`]: Counter sinks
//! - [`reconciler`]: The reconciliation pass
//! - [`worker`]: Periodic scheduling

#![deny(missing_docs)]

/// Claims-tracking clients.
pub mod client;

/// Configuration from environment variables.
pub mod config;

/// Error types.
pub mod error;

/// Feature flags and snapshots.
pub mod flags;

/// Per-kind reconciliation profiles.
pub mod kinds;

/// Run leases.
pub mod lease;

/// Counter sinks.
pub mod metrics;

/// The reconciliation pass.
pub mod reconciler;

/// Periodic scheduling.
pub mod worker;

pub use client::{ClaimsTrackingClient, ClientError, LighthouseClient, MockClaimsClient};
pub use config::Config;
pub use error::{Error, Result};
pub use flags::{FeatureFlags, FlagSnapshot, StaticFeatureFlags, StoreFeatureFlags};
pub use lease::{RunLease, StoreLease};
pub use metrics::{MetricsSink, RecordingMetrics, TracingMetrics};
pub use reconciler::{ReconcileReport, SubmissionStatusReconciler};
pub use worker::{ReconcilerWorker, ReconcilerWorkerConfig};
