// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Feature flags gating the reconciler.
//!
//! Flags are read once per invocation into a [`FlagSnapshot`]; the reconciler
//! never consults the flag source in the middle of a pass.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use claimsync_core::{SubmissionKind, SubmissionStore};

use crate::error::Result;
use crate::kinds::{self, TRACK_SECONDARY_FORMS_FLAG};

/// Source of feature flag values.
#[async_trait]
pub trait FeatureFlags: Send + Sync {
    /// Whether the named flag is enabled. Unknown flags are disabled.
    async fn is_enabled(&self, name: &str) -> Result<bool>;
}

/// Flags persisted in the store, overridable per process.
///
/// `CLAIMSYNC_FLAG_<UPPER_NAME>` takes precedence over the stored value;
/// `true` or `1` enables the flag, any other value disables it.
pub struct StoreFeatureFlags {
    store: Arc<dyn SubmissionStore>,
}

impl StoreFeatureFlags {
    /// Read flags from `store`.
    pub fn new(store: Arc<dyn SubmissionStore>) -> Self {
        Self { store }
    }

    /// Environment variable that overrides `name`.
    pub fn override_var(name: &str) -> String {
        format!("CLAIMSYNC_FLAG_{}", name.to_ascii_uppercase())
    }
}

#[async_trait]
impl FeatureFlags for StoreFeatureFlags {
    async fn is_enabled(&self, name: &str) -> Result<bool> {
        if let Ok(v) = std::env::var(Self::override_var(name)) {
            return Ok(v == "true" || v == "1");
        }
        Ok(self.store.get_feature_flag(name).await?.unwrap_or(false))
    }
}

/// A fixed set of enabled flags.
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureFlags {
    enabled: HashSet<String>,
}

impl StaticFeatureFlags {
    /// Enable exactly the given flags.
    pub fn new<I, S>(enabled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: enabled.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl FeatureFlags for StaticFeatureFlags {
    async fn is_enabled(&self, name: &str) -> Result<bool> {
        Ok(self.enabled.contains(name))
    }
}

/// Flag values for one kind, captured at the start of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSnapshot {
    /// The kind's reconciler is enabled.
    pub reconciler_enabled: bool,
    /// Secondary form tracking is enabled.
    pub track_secondary_forms: bool,
}

impl FlagSnapshot {
    /// Read the flags relevant to `kind`.
    pub async fn capture(flags: &dyn FeatureFlags, kind: SubmissionKind) -> Result<Self> {
        let profile = kinds::profile(kind);
        let reconciler_enabled = flags.is_enabled(profile.enable_flag).await?;
        let track_secondary_forms = if profile.tracks_secondary_forms {
            flags.is_enabled(TRACK_SECONDARY_FORMS_FLAG).await?
        } else {
            false
        };
        Ok(Self {
            reconciler_enabled,
            track_secondary_forms,
        })
    }

    /// Reconciler enabled, secondary form tracking disabled.
    pub fn enabled() -> Self {
        Self {
            reconciler_enabled: true,
            track_secondary_forms: false,
        }
    }

    /// Reconciler and secondary form tracking enabled.
    pub fn all_enabled() -> Self {
        Self {
            reconciler_enabled: true,
            track_secondary_forms: true,
        }
    }

    /// Everything disabled.
    pub fn disabled() -> Self {
        Self {
            reconciler_enabled: false,
            track_secondary_forms: false,
        }
    }
}
