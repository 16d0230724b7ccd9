// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Submission records.
//!
//! A [`Submission`] is the primary form tracked upstream. It owns zero or more
//! [`EvidenceUpload`]s and zero or more [`SecondaryForm`]s. Status metadata is
//! stored as the JSON text produced by the upstream tracking service, so the
//! raw upstream status string is always available for change detection.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Metadata key holding the per-upload status array.
pub const UPLOADS_KEY: &str = "uploads";

/// Kind of decision-review submission being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    /// Supplemental Claim (form 20-0995).
    SupplementalClaim,
    /// Higher-Level Review (form 20-0996).
    HigherLevelReview,
    /// Notice of Disagreement / Board Appeal (form 10182).
    NoticeOfDisagreement,
}

impl SubmissionKind {
    /// Every kind, in a stable order.
    pub const ALL: [SubmissionKind; 3] = [
        SubmissionKind::SupplementalClaim,
        SubmissionKind::HigherLevelReview,
        SubmissionKind::NoticeOfDisagreement,
    ];

    /// Persisted name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::SupplementalClaim => "supplemental_claim",
            SubmissionKind::HigherLevelReview => "higher_level_review",
            SubmissionKind::NoticeOfDisagreement => "notice_of_disagreement",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supplemental_claim" => Ok(SubmissionKind::SupplementalClaim),
            "higher_level_review" => Ok(SubmissionKind::HigherLevelReview),
            "notice_of_disagreement" => Ok(SubmissionKind::NoticeOfDisagreement),
            other => Err(StoreError::InvalidRecord(format!(
                "unknown submission kind '{}'",
                other
            ))),
        }
    }
}

/// Normalized status of a submission.
///
/// The upstream service reports more states than we distinguish; see
/// [`SubmissionStatus::from_upstream`] for the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Accepted upstream, not yet picked up.
    Pending,
    /// Being submitted or processed upstream.
    Processing,
    /// Fully processed upstream.
    Complete,
    /// Upstream reported a terminal error.
    Error,
    /// Any status string we do not recognize.
    Unknown,
}

impl SubmissionStatus {
    /// Map a raw upstream status string onto the normalized enum.
    pub fn from_upstream(raw: &str) -> Self {
        match raw {
            "pending" => SubmissionStatus::Pending,
            "submitting" | "submitted" | "processing" | "success" => SubmissionStatus::Processing,
            "complete" => SubmissionStatus::Complete,
            "error" => SubmissionStatus::Error,
            _ => SubmissionStatus::Unknown,
        }
    }

    /// Persisted name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Processing => "processing",
            SubmissionStatus::Complete => "complete",
            SubmissionStatus::Error => "error",
            SubmissionStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "processing" => Ok(SubmissionStatus::Processing),
            "complete" => Ok(SubmissionStatus::Complete),
            "error" => Ok(SubmissionStatus::Error),
            "unknown" => Ok(SubmissionStatus::Unknown),
            other => Err(StoreError::InvalidRecord(format!(
                "unknown submission status '{}'",
                other
            ))),
        }
    }
}

/// A submitted claim tracked until it is fully resolved upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Upstream identifier (UUID).
    pub id: String,
    /// Which decision-review form this is.
    pub kind: SubmissionKind,
    /// Normalized status from the last poll (None before the first poll).
    pub status: Option<SubmissionStatus>,
    /// Raw JSON object of the last stored upstream attributes.
    pub metadata: Option<String>,
    /// When `metadata` was last written.
    pub metadata_updated_at: Option<DateTime<Utc>>,
    /// Retention timestamp; set once everything resolved successfully.
    pub delete_date: Option<DateTime<Utc>>,
    /// When the submission was created by intake.
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// A freshly submitted record with no status yet.
    pub fn new(id: impl Into<String>, kind: SubmissionKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind,
            status: None,
            metadata: None,
            metadata_updated_at: None,
            delete_date: None,
            created_at,
        }
    }

    /// Whether the retention timestamp has been set.
    pub fn is_resolved(&self) -> bool {
        self.delete_date.is_some()
    }

    /// Parse the stored metadata into a JSON object.
    ///
    /// Missing metadata yields an empty object. Metadata that is valid JSON but
    /// not an object is rejected.
    pub fn metadata_object(&self) -> Result<Map<String, Value>, StoreError> {
        let Some(raw) = self.metadata.as_deref() else {
            return Ok(Map::new());
        };
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::InvalidRecord(format!(
                "metadata of submission {} is not a JSON object",
                self.id
            ))),
        }
    }

    /// Raw upstream status stored at the last poll.
    pub fn stored_status(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .metadata_object()?
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Previously stored upload statuses keyed by upload id.
    pub fn stored_upload_statuses(&self) -> Result<HashMap<String, String>, StoreError> {
        let metadata = self.metadata_object()?;
        let mut statuses = HashMap::new();
        if let Some(Value::Array(uploads)) = metadata.get(UPLOADS_KEY) {
            for upload in uploads {
                if let (Some(id), Some(status)) = (
                    upload.get("id").and_then(Value::as_str),
                    upload.get("status").and_then(Value::as_str),
                ) {
                    statuses.insert(id.to_string(), status.to_string());
                }
            }
        }
        Ok(statuses)
    }
}

/// An evidence file uploaded upstream on behalf of a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceUpload {
    /// Upstream upload identifier.
    pub id: String,
    /// Owning submission.
    pub submission_id: String,
    /// Status recorded by intake.
    pub status: Option<String>,
    /// Status detail recorded by intake.
    pub detail: Option<String>,
    /// When the upload was recorded.
    pub created_at: DateTime<Utc>,
}

impl EvidenceUpload {
    /// A new upload record for a submission.
    pub fn new(
        id: impl Into<String>,
        submission_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            submission_id: submission_id.into(),
            status: None,
            detail: None,
            created_at,
        }
    }
}

/// A secondary form (e.g. 21-4142) submitted alongside a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryForm {
    /// Upstream identifier of the secondary form upload.
    pub id: String,
    /// Owning submission.
    pub submission_id: String,
    /// Form number, e.g. `21-4142`.
    pub form_id: String,
    /// Raw JSON object of the last stored upload attributes.
    pub status: Option<String>,
    /// When `status` was last written.
    pub status_updated_at: Option<DateTime<Utc>>,
    /// Own retention timestamp, set once the form reached a successful status.
    pub delete_date: Option<DateTime<Utc>>,
    /// When the form was recorded.
    pub created_at: DateTime<Utc>,
}

impl SecondaryForm {
    /// A new secondary form record for a submission.
    pub fn new(
        id: impl Into<String>,
        submission_id: impl Into<String>,
        form_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            submission_id: submission_id.into(),
            form_id: form_id.into(),
            status: None,
            status_updated_at: None,
            delete_date: None,
            created_at,
        }
    }

    /// Whether the form has its own retention timestamp.
    pub fn is_resolved(&self) -> bool {
        self.delete_date.is_some()
    }

    /// Raw upstream status stored at the last poll.
    pub fn stored_status(&self) -> Result<Option<String>, StoreError> {
        let Some(raw) = self.status.as_deref() else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(raw)?;
        Ok(value
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

/// Single-row update written after polling a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionStatusUpdate {
    /// Normalized status.
    pub status: SubmissionStatus,
    /// Merged metadata JSON object.
    pub metadata: String,
    /// Time of the poll.
    pub metadata_updated_at: DateTime<Utc>,
    /// Retention timestamp, only when fully resolved.
    pub delete_date: Option<DateTime<Utc>>,
}

/// Single-row update written after polling a secondary form.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryFormStatusUpdate {
    /// Upload attributes JSON object.
    pub status: String,
    /// Time of the poll.
    pub status_updated_at: DateTime<Utc>,
    /// Retention timestamp, only when the form succeeded.
    pub delete_date: Option<DateTime<Utc>>,
}
