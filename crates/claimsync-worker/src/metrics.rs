// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Counter sink for reconciler observability.
//!
//! Counters are StatsD-shaped: a dotted name, an increment, and a list of
//! `key:value` tags. [`TracingMetrics`] forwards them as structured tracing
//! events so any subscriber (or log shipper) can aggregate them;
//! [`RecordingMetrics`] keeps them in memory.

use std::sync::{Mutex, PoisonError};

use tracing::info;

/// Name of the counter raised for silent failures.
pub const SILENT_FAILURE: &str = "silent_failure";

/// Destination for counter increments.
pub trait MetricsSink: Send + Sync {
    /// Increment counter `name` by `by`.
    fn increment(&self, name: &str, by: u64, tags: &[String]);
}

/// Emits every increment as a tracing event on target `claimsync::metrics`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn increment(&self, name: &str, by: u64, tags: &[String]) {
        info!(
            target: "claimsync::metrics",
            metric = name,
            by,
            tags = %tags.join(","),
            "counter"
        );
    }
}

/// One recorded increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedIncrement {
    /// Counter name.
    pub name: String,
    /// Increment amount.
    pub by: u64,
    /// Tags attached to the increment.
    pub tags: Vec<String>,
}

/// In-memory sink that records every increment.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    increments: Mutex<Vec<RecordedIncrement>>,
}

impl RecordingMetrics {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every increment recorded so far.
    pub fn increments(&self) -> Vec<RecordedIncrement> {
        self.increments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum of increments of `name`.
    pub fn total(&self, name: &str) -> u64 {
        self.increments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|i| i.name == name)
            .map(|i| i.by)
            .sum()
    }

    /// Sum of increments of `name` carrying `tag`.
    pub fn total_tagged(&self, name: &str, tag: &str) -> u64 {
        self.increments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|i| i.name == name && i.tags.iter().any(|t| t == tag))
            .map(|i| i.by)
            .sum()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.increments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl MetricsSink for RecordingMetrics {
    fn increment(&self, name: &str, by: u64, tags: &[String]) {
        self.increments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedIncrement {
                name: name.to_string(),
                by,
                tags: tags.to_vec(),
            });
    }
}
