// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for claimsync-worker.

use std::time::Duration;

use claimsync_core::SubmissionKind;

/// Default Decision Reviews API base URL (sandbox).
pub const DEFAULT_LIGHTHOUSE_BASE_URL: &str =
    "https://sandbox-api.va.gov/services/appeals/v2/decision_reviews";

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL for the submission store
    pub database_url: String,
    /// Base URL of the Decision Reviews API
    pub lighthouse_base_url: String,
    /// API key sent in the `apikey` header
    pub lighthouse_api_key: String,
    /// Per-request timeout for upstream lookups
    pub http_timeout: Duration,
    /// Kinds to run a reconciler for
    pub kinds: Vec<SubmissionKind>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("CLAIMSYNC_DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("CLAIMSYNC_DATABASE_URL"))?;

        let lighthouse_base_url = std::env::var("CLAIMSYNC_LIGHTHOUSE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_LIGHTHOUSE_BASE_URL.to_string());

        let lighthouse_api_key = std::env::var("CLAIMSYNC_LIGHTHOUSE_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("CLAIMSYNC_LIGHTHOUSE_API_KEY"))?;

        let http_timeout_secs: u64 = match std::env::var("CLAIMSYNC_HTTP_TIMEOUT_SECS") {
            Ok(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "CLAIMSYNC_HTTP_TIMEOUT_SECS",
                value: v,
            })?,
            Err(_) => 30,
        };

        let kinds = match std::env::var("CLAIMSYNC_KINDS") {
            Ok(v) => parse_kinds(&v)?,
            Err(_) => SubmissionKind::ALL.to_vec(),
        };

        Ok(Self {
            database_url,
            lighthouse_base_url,
            lighthouse_api_key,
            http_timeout: Duration::from_secs(http_timeout_secs),
            kinds,
        })
    }
}

/// Parse a comma-separated kind list, dropping duplicates.
pub fn parse_kinds(value: &str) -> Result<Vec<SubmissionKind>, ConfigError> {
    let mut kinds = Vec::new();
    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind: SubmissionKind = name.parse().map_err(|_| ConfigError::InvalidValue {
            name: "CLAIMSYNC_KINDS",
            value: name.to_string(),
        })?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        return Err(ConfigError::InvalidValue {
            name: "CLAIMSYNC_KINDS",
            value: value.to_string(),
        });
    }
    Ok(kinds)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}
