// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock claims-tracking client for testing.
//!
//! Statuses are scripted per identifier. Lookups of identifiers that were
//! never scripted answer like a missing upstream record (404).

use async_trait::async_trait;
use claimsync_core::SubmissionKind;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::traits::*;

/// Scripted answer for one identifier.
#[derive(Debug, Clone)]
enum Scripted {
    Attributes(Map<String, Value>),
    Failure(String),
}

#[derive(Debug, Default)]
struct MockState {
    submissions: HashMap<String, Scripted>,
    uploads: HashMap<String, Scripted>,
    status_calls: Vec<String>,
    upload_calls: Vec<String>,
}

/// Mock claims-tracking client.
#[derive(Clone, Default)]
pub struct MockClaimsClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClaimsClient {
    /// Create a mock with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `get_status(id)` with `status` and no other attributes.
    pub async fn set_status(&self, id: &str, status: &str) {
        self.set_status_attributes(id, json!({ "status": status })).await;
    }

    /// Answer `get_status(id)` with the given attributes object.
    ///
    /// Non-object values are ignored.
    pub async fn set_status_attributes(&self, id: &str, attributes: Value) {
        if let Value::Object(map) = attributes {
            let mut state = self.state.lock().await;
            state
                .submissions
                .insert(id.to_string(), Scripted::Attributes(map));
        }
    }

    /// Make `get_status(id)` fail.
    pub async fn fail_status(&self, id: &str, message: &str) {
        let mut state = self.state.lock().await;
        state
            .submissions
            .insert(id.to_string(), Scripted::Failure(message.to_string()));
    }

    /// Answer `get_upload_status(id)` with `status` and `detail`.
    pub async fn set_upload_status(&self, id: &str, status: &str, detail: &str) {
        let attributes = json!({
            "status": status,
            "detail": detail,
            "createDate": "2025-03-01T00:00:00.000Z",
            "updateDate": "2025-03-01T00:00:00.000Z",
        });
        if let Value::Object(map) = attributes {
            let mut state = self.state.lock().await;
            state.uploads.insert(id.to_string(), Scripted::Attributes(map));
        }
    }

    /// Make `get_upload_status(id)` fail.
    pub async fn fail_upload(&self, id: &str, message: &str) {
        let mut state = self.state.lock().await;
        state
            .uploads
            .insert(id.to_string(), Scripted::Failure(message.to_string()));
    }

    /// Identifiers passed to `get_status`, in call order.
    pub async fn status_calls(&self) -> Vec<String> {
        self.state.lock().await.status_calls.clone()
    }

    /// Identifiers passed to `get_upload_status`, in call order.
    pub async fn upload_calls(&self) -> Vec<String> {
        self.state.lock().await.upload_calls.clone()
    }

    /// Total number of lookups of either kind.
    pub async fn total_calls(&self) -> usize {
        let state = self.state.lock().await;
        state.status_calls.len() + state.upload_calls.len()
    }
}

fn not_found(id: &str) -> ClientError {
    ClientError::Status {
        status: 404,
        body: format!("{{\"errors\":[{{\"title\":\"Record not found\",\"detail\":\"{}\"}}]}}", id),
    }
}

#[async_trait]
impl ClaimsTrackingClient for MockClaimsClient {
    fn client_type(&self) -> &'static str {
        "mock"
    }

    async fn get_status(
        &self,
        _kind: SubmissionKind,
        submission_id: &str,
    ) -> Result<SubmissionStatusResponse> {
        let mut state = self.state.lock().await;
        state.status_calls.push(submission_id.to_string());
        match state.submissions.get(submission_id) {
            Some(Scripted::Attributes(attributes)) => {
                submission_response(&json!({ "data": { "attributes": attributes } }))
            }
            Some(Scripted::Failure(message)) => Err(ClientError::Other(message.clone())),
            None => Err(not_found(submission_id)),
        }
    }

    async fn get_upload_status(
        &self,
        _kind: SubmissionKind,
        upload_id: &str,
    ) -> Result<UploadStatusResponse> {
        let mut state = self.state.lock().await;
        state.upload_calls.push(upload_id.to_string());
        match state.uploads.get(upload_id) {
            Some(Scripted::Attributes(attributes)) => {
                upload_response(&json!({ "data": { "attributes": attributes } }))
            }
            Some(Scripted::Failure(message)) => Err(ClientError::Other(message.clone())),
            None => Err(not_found(upload_id)),
        }
    }
}
