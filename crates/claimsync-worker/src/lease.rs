// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Run leases keeping overlapping scheduled runs apart.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use claimsync_core::SubmissionStore;

use crate::error::{Error, Result};

/// Named, expiring mutual exclusion between processes.
#[async_trait]
pub trait RunLease: Send + Sync {
    /// Try to hold `name` for `ttl`. Returns false when someone else holds it.
    async fn try_acquire(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool>;

    /// Give up `name` if `holder` still holds it.
    async fn release(&self, name: &str, holder: &str) -> Result<bool>;
}

/// Lease backed by the store's `job_leases` table.
///
/// Expired leases are taken over by the next caller.
pub struct StoreLease {
    store: Arc<dyn SubmissionStore>,
}

impl StoreLease {
    /// Keep leases in `store`.
    pub fn new(store: Arc<dyn SubmissionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RunLease for StoreLease {
    async fn try_acquire(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| Error::Other(format!("Invalid lease TTL: {}", e)))?;
        let now = Utc::now();
        Ok(self
            .store
            .try_acquire_lease(name, holder, now, now + ttl)
            .await?)
    }

    async fn release(&self, name: &str, holder: &str) -> Result<bool> {
        Ok(self.store.release_lease(name, holder).await?)
    }
}
