// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Background worker that runs the reconciler on a fixed interval.
//!
//! Each tick:
//! 1. Takes the run lease `reconciler:<kind>` so overlapping runs (other
//!    processes, or a slow previous tick) are skipped
//! 2. Captures a [`FlagSnapshot`] for the kind
//! 3. Runs one reconciliation pass
//! 4. Releases the lease

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::flags::{FeatureFlags, FlagSnapshot};
use crate::lease::RunLease;
use crate::reconciler::{ReconcileReport, SubmissionStatusReconciler};

/// Configuration for the reconciler worker.
#[derive(Debug, Clone)]
pub struct ReconcilerWorkerConfig {
    /// How often to run a pass.
    pub poll_interval: Duration,
    /// How long a pass may hold the run lease.
    pub lease_ttl: Duration,
    /// Run a pass immediately instead of waiting one interval.
    pub run_on_start: bool,
}

impl Default for ReconcilerWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3600), // 1 hour
            lease_ttl: Duration::from_secs(1800),     // 30 minutes
            run_on_start: true,
        }
    }
}

impl ReconcilerWorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CLAIMSYNC_POLL_INTERVAL_SECS`: seconds between passes (default: 3600)
    /// - `CLAIMSYNC_LEASE_TTL_SECS`: run lease duration in seconds (default: 1800)
    /// - `CLAIMSYNC_RUN_ON_START`: "false" or "0" to wait one interval first (default: true)
    pub fn from_env() -> Self {
        let poll_interval_secs = std::env::var("CLAIMSYNC_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let lease_ttl_secs = std::env::var("CLAIMSYNC_LEASE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1800);

        let run_on_start = std::env::var("CLAIMSYNC_RUN_ON_START")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            poll_interval: Duration::from_secs(poll_interval_secs),
            lease_ttl: Duration::from_secs(lease_ttl_secs),
            run_on_start,
        }
    }
}

/// Background worker driving one kind's reconciler.
pub struct ReconcilerWorker {
    reconciler: SubmissionStatusReconciler,
    flags: Arc<dyn FeatureFlags>,
    lease: Arc<dyn RunLease>,
    holder: String,
    config: ReconcilerWorkerConfig,
    shutdown: Arc<Notify>,
}

impl ReconcilerWorker {
    /// Create a new reconciler worker.
    pub fn new(
        reconciler: SubmissionStatusReconciler,
        flags: Arc<dyn FeatureFlags>,
        lease: Arc<dyn RunLease>,
        config: ReconcilerWorkerConfig,
    ) -> Self {
        Self {
            reconciler,
            flags,
            lease,
            holder: format!("claimsync-worker-{}", Uuid::new_v4()),
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Identity written into the lease row.
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Name of the run lease for this worker's kind.
    pub fn lease_name(&self) -> String {
        format!("reconciler:{}", self.reconciler.kind())
    }

    /// Run the worker loop until shutdown is signalled.
    ///
    /// Shutdown is observed between ticks; a running pass is never cut short.
    pub async fn run(&self) {
        info!(
            kind = %self.reconciler.kind(),
            poll_interval_secs = self.config.poll_interval.as_secs(),
            lease_ttl_secs = self.config.lease_ttl.as_secs(),
            "Reconciler worker started"
        );

        if self.config.run_on_start {
            self.tick().await;
        }

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    info!(kind = %self.reconciler.kind(), "Reconciler worker received shutdown signal");
                    break;
                }

                _ = tokio::time::sleep(self.config.poll_interval) => {
                    self.tick().await;
                }
            }
        }

        info!(kind = %self.reconciler.kind(), "Reconciler worker stopped");
    }

    /// Run one scheduled pass. Returns `None` when the tick was skipped.
    pub async fn tick(&self) -> Option<ReconcileReport> {
        let lease_name = self.lease_name();

        match self
            .lease
            .try_acquire(&lease_name, &self.holder, self.config.lease_ttl)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(lease = %lease_name, "Run lease held elsewhere, skipping tick");
                return None;
            }
            Err(e) => {
                error!(lease = %lease_name, error = %e, "Failed to acquire run lease");
                return None;
            }
        }

        let report = match FlagSnapshot::capture(self.flags.as_ref(), self.reconciler.kind()).await
        {
            Ok(flags) => Some(self.reconciler.run_once(&flags).await),
            Err(e) => {
                error!(kind = %self.reconciler.kind(), error = %e, "Failed to read feature flags");
                None
            }
        };

        if let Err(e) = self.lease.release(&lease_name, &self.holder).await {
            warn!(lease = %lease_name, error = %e, "Failed to release run lease");
        }

        report
    }
}
