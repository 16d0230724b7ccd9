// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Claims-tracking client trait definitions.
//!
//! Defines the abstract interface the reconciler uses to read upstream status.

use async_trait::async_trait;
use claimsync_core::SubmissionKind;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from claims-tracking lookups.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status code.
    #[error("Upstream returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response did not carry `data.attributes.status`.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The kind has no endpoint for the requested lookup.
    #[error("Unsupported lookup: {0}")]
    Unsupported(String),

    /// Other error.
    #[error("Other: {0}")]
    Other(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Current upstream state of a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionStatusResponse {
    /// Raw upstream status string, e.g. `pending` or `complete`.
    pub status: String,
    /// Every attribute returned upstream (includes `status`).
    pub attributes: Map<String, Value>,
}

/// Current upstream state of an evidence upload or secondary form.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadStatusResponse {
    /// Raw upstream upload status, e.g. `processing`, `vbms` or `error`.
    pub status: String,
    /// Upstream status detail (empty when absent).
    pub detail: String,
    /// Every attribute returned upstream.
    pub attributes: Map<String, Value>,
}

impl UploadStatusResponse {
    /// Attribute names kept when an upload status is stored.
    pub const STORED_ATTRIBUTES: [&'static str; 4] = ["status", "detail", "createDate", "updateDate"];

    /// The subset of attributes that is persisted for uploads and forms.
    pub fn stored_attributes(&self) -> Map<String, Value> {
        Self::STORED_ATTRIBUTES
            .iter()
            .filter_map(|key| {
                self.attributes
                    .get(*key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }
}

/// Trait for claims-tracking clients.
///
/// Clients are pure lookups; they never touch persistence. Timeouts are a
/// property of the client implementation.
#[async_trait]
pub trait ClaimsTrackingClient: Send + Sync {
    /// Client type identifier (e.g., "lighthouse", "mock").
    fn client_type(&self) -> &'static str;

    /// Fetch the current status and attributes of a submission.
    async fn get_status(
        &self,
        kind: SubmissionKind,
        submission_id: &str,
    ) -> Result<SubmissionStatusResponse>;

    /// Fetch the current status of an upload (evidence or secondary form).
    async fn get_upload_status(
        &self,
        kind: SubmissionKind,
        upload_id: &str,
    ) -> Result<UploadStatusResponse>;
}

/// Extract `data.attributes` from a decision-review response body.
pub(crate) fn response_attributes(body: &Value) -> Result<Map<String, Value>> {
    body.get("data")
        .and_then(|data| data.get("attributes"))
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| ClientError::MalformedResponse("missing data.attributes".to_string()))
}

/// Build a submission response from `data.attributes`.
pub(crate) fn submission_response(body: &Value) -> Result<SubmissionStatusResponse> {
    let attributes = response_attributes(body)?;
    let status = attributes
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ClientError::MalformedResponse("missing data.attributes.status".to_string())
        })?
        .to_string();
    Ok(SubmissionStatusResponse { status, attributes })
}

/// Build an upload response from `data.attributes`.
pub(crate) fn upload_response(body: &Value) -> Result<UploadStatusResponse> {
    let attributes = response_attributes(body)?;
    let status = attributes
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ClientError::MalformedResponse("missing data.attributes.status".to_string())
        })?
        .to_string();
    let detail = attributes
        .get("detail")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(UploadStatusResponse {
        status,
        detail,
        attributes,
    })
}
