// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lighthouse Decision Reviews API client.
//!
//! Reads submission and evidence upload status over HTTPS:
//!
//! | Kind | Submission | Evidence upload |
//! |------|------------|-----------------|
//! | Supplemental Claim | `GET /supplemental_claims/{id}` | `GET /supplemental_claims/evidence_submissions/{id}` |
//! | Higher-Level Review | `GET /higher_level_reviews/{id}` | - |
//! | Notice of Disagreement | `GET /notice_of_disagreements/{id}` | `GET /notice_of_disagreements/evidence_submissions/{id}` |
//!
//! Secondary forms are uploaded through the Supplemental Claim evidence
//! endpoint, so their status is read the same way.

use std::time::Duration;

use async_trait::async_trait;
use claimsync_core::SubmissionKind;
use serde_json::Value;
use tracing::debug;

use super::traits::*;

/// Longest response body kept in a [`ClientError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for the Lighthouse Decision Reviews API.
#[derive(Clone)]
pub struct LighthouseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LighthouseClient {
    /// Create a client for `base_url` authenticating with `api_key`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn submission_path(kind: SubmissionKind) -> &'static str {
        match kind {
            SubmissionKind::SupplementalClaim => "supplemental_claims",
            SubmissionKind::HigherLevelReview => "higher_level_reviews",
            SubmissionKind::NoticeOfDisagreement => "notice_of_disagreements",
        }
    }

    fn upload_path(kind: SubmissionKind) -> Option<&'static str> {
        match kind {
            SubmissionKind::SupplementalClaim => Some("supplemental_claims/evidence_submissions"),
            SubmissionKind::NoticeOfDisagreement => {
                Some("notice_of_disagreements/evidence_submissions")
            }
            SubmissionKind::HigherLevelReview => None,
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Fetching upstream status");

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl ClaimsTrackingClient for LighthouseClient {
    fn client_type(&self) -> &'static str {
        "lighthouse"
    }

    async fn get_status(
        &self,
        kind: SubmissionKind,
        submission_id: &str,
    ) -> Result<SubmissionStatusResponse> {
        let body = self
            .get_json(&format!("{}/{}", Self::submission_path(kind), submission_id))
            .await?;
        submission_response(&body)
    }

    async fn get_upload_status(
        &self,
        kind: SubmissionKind,
        upload_id: &str,
    ) -> Result<UploadStatusResponse> {
        let Some(path) = Self::upload_path(kind) else {
            return Err(ClientError::Unsupported(format!(
                "{} has no evidence upload endpoint",
                kind
            )));
        };
        let body = self.get_json(&format!("{}/{}", path, upload_id)).await?;
        upload_response(&body)
    }
}
