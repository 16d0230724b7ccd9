// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Submission status reconciliation.
//!
//! One pass walks every open submission of a kind (oldest first), reads its
//! upstream status together with the status of its evidence uploads and
//! secondary forms, merges the result into the stored metadata and sets the
//! retention timestamp once everything has succeeded:
//!
//! 1. Fetch the submission status. On failure the record is left untouched.
//! 2. Fetch every evidence upload independently.
//! 3. Fetch and persist every open secondary form (when tracked).
//! 4. Merge attributes into the stored metadata.
//! 5. Decide completion and write the submission row.
//!
//! Errors never escape a record: they are logged, counted under
//! `<prefix>.error`, and the pass moves on. Status-change counters and
//! silent-failure alerts fire only when the observed status differs from the
//! stored one, so polling an unchanged status is quiet.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use claimsync_core::models::UPLOADS_KEY;
use claimsync_core::{
    SecondaryFormStatusUpdate, Submission, SubmissionKind, SubmissionStatus,
    SubmissionStatusUpdate, SubmissionStore,
};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::client::ClaimsTrackingClient;
use crate::error::Result;
use crate::flags::FlagSnapshot;
use crate::kinds::{self, ERROR_STATUS, KindProfile};
use crate::metrics::{MetricsSink, SILENT_FAILURE};

/// Days a resolved submission (or secondary form) is kept before deletion.
pub const RETENTION_PERIOD_DAYS: i64 = 59;

/// Retention window applied to resolved records.
pub fn retention_period() -> Duration {
    Duration::days(RETENTION_PERIOD_DAYS)
}

/// Summary of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Open submissions visited.
    pub processed: usize,
    /// Submissions that received a retention timestamp.
    pub completed: usize,
    /// Submissions whose processing failed.
    pub failed: usize,
}

/// Reconciles open submissions of one kind against the claims-tracking API.
pub struct SubmissionStatusReconciler {
    store: Arc<dyn SubmissionStore>,
    client: Arc<dyn ClaimsTrackingClient>,
    metrics: Arc<dyn MetricsSink>,
    profile: &'static KindProfile,
}

/// Evidence uploads fetched for one submission.
struct EvidenceOutcome {
    entries: Vec<Map<String, Value>>,
    all_successful: bool,
}

impl SubmissionStatusReconciler {
    /// Create a reconciler for `kind`.
    pub fn new(
        kind: SubmissionKind,
        store: Arc<dyn SubmissionStore>,
        client: Arc<dyn ClaimsTrackingClient>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            store,
            client,
            metrics,
            profile: kinds::profile(kind),
        }
    }

    /// The kind this reconciler handles.
    pub fn kind(&self) -> SubmissionKind {
        self.profile.kind
    }

    /// Run one pass using the current time.
    pub async fn run_once(&self, flags: &FlagSnapshot) -> ReconcileReport {
        self.run_once_at(flags, Utc::now()).await
    }

    /// Run one pass, treating `now` as the current time.
    pub async fn run_once_at(&self, flags: &FlagSnapshot, now: DateTime<Utc>) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        if !flags.reconciler_enabled {
            debug!(kind = %self.profile.kind, "Reconciler disabled, skipping pass");
            return report;
        }

        let submissions = match self.store.list_open_submissions(self.profile.kind).await {
            Ok(submissions) => submissions,
            Err(e) => {
                error!(kind = %self.profile.kind, error = %e, "Failed to list open submissions");
                self.count(&self.profile.metric(".error"), &[]);
                return report;
            }
        };

        if submissions.is_empty() {
            return report;
        }

        self.count_by(
            &self.profile.metric(".processing_records"),
            submissions.len() as u64,
            &[],
        );

        for submission in &submissions {
            report.processed += 1;
            match self.reconcile(submission, flags, now).await {
                Ok(true) => report.completed += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    self.count(&self.profile.metric(".error"), &[]);
                    error!(
                        kind = %self.profile.kind,
                        submission_id = %submission.id,
                        error = %e,
                        "Failed to reconcile submission"
                    );
                }
            }
        }

        info!(
            kind = %self.profile.kind,
            processed = report.processed,
            completed = report.completed,
            failed = report.failed,
            "Reconciliation pass finished"
        );

        report
    }

    /// Reconcile one submission. Returns whether it was resolved.
    async fn reconcile(
        &self,
        submission: &Submission,
        flags: &FlagSnapshot,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut metadata = submission.metadata_object()?;
        let previous_status = metadata
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string);
        let previous_uploads = submission.stored_upload_statuses()?;

        let response = self
            .client
            .get_status(self.profile.kind, &submission.id)
            .await?;

        let evidence = if self.profile.tracks_evidence {
            self.refresh_evidence(submission, &previous_uploads).await?
        } else {
            EvidenceOutcome {
                entries: Vec::new(),
                all_successful: true,
            }
        };

        let secondary_complete = if self.profile.tracks_secondary_forms
            && flags.track_secondary_forms
        {
            self.refresh_secondary_forms(submission, now).await?
        } else {
            true
        };

        // The stored uploads array is owned here; an upstream `uploads`
        // attribute must not replace it.
        let stored_uploads = if self.profile.tracks_evidence {
            metadata.remove(UPLOADS_KEY)
        } else {
            None
        };
        for (key, value) in response.attributes {
            if self.profile.tracks_evidence && key == UPLOADS_KEY {
                continue;
            }
            metadata.insert(key, value);
        }
        metadata.insert("status".to_string(), Value::String(response.status.clone()));
        if self.profile.tracks_evidence {
            let merged = merge_uploads(stored_uploads, evidence.entries);
            metadata.insert(UPLOADS_KEY.to_string(), merged);
        }

        let complete = kinds::is_successful_status(&response.status)
            && evidence.all_successful
            && secondary_complete;

        let delete_date = if complete {
            self.count(&self.profile.metric(".delete_date_update"), &[]);
            Some(now + retention_period())
        } else {
            if previous_status.as_deref() != Some(response.status.as_str()) {
                if response.status == ERROR_STATUS {
                    warn!(
                        kind = %self.profile.kind,
                        submission_id = %submission.id,
                        "Submission status error"
                    );
                    self.silent_failure(
                        self.profile.service_tag,
                        "form submission to Lighthouse",
                    );
                }
                self.count(
                    &self.profile.metric(".status"),
                    &[format!("status:{}", response.status)],
                );
            }
            None
        };

        let update = SubmissionStatusUpdate {
            status: SubmissionStatus::from_upstream(&response.status),
            metadata: serde_json::to_string(&Value::Object(metadata))?,
            metadata_updated_at: now,
            delete_date,
        };
        self.store
            .update_submission_status(&submission.id, &update)
            .await?;

        Ok(complete)
    }

    /// Fetch every evidence upload of a submission.
    ///
    /// A failed lookup keeps the upload out of `entries` and makes the
    /// aggregate false; the remaining uploads are still fetched.
    async fn refresh_evidence(
        &self,
        submission: &Submission,
        previous: &HashMap<String, String>,
    ) -> Result<EvidenceOutcome> {
        let uploads = self.store.list_evidence_uploads(&submission.id).await?;
        let mut outcome = EvidenceOutcome {
            entries: Vec::with_capacity(uploads.len()),
            all_successful: true,
        };

        for upload in uploads {
            let response = match self
                .client
                .get_upload_status(self.profile.kind, &upload.id)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        kind = %self.profile.kind,
                        submission_id = %submission.id,
                        upload_id = %upload.id,
                        error = %e,
                        "Failed to fetch evidence upload status"
                    );
                    self.count(&self.profile.metric("_upload.fetch_error"), &[]);
                    outcome.all_successful = false;
                    continue;
                }
            };

            if !kinds::is_successful_upload_status(&response.status) {
                outcome.all_successful = false;
            }

            if previous.get(&upload.id) != Some(&response.status) {
                if response.status == ERROR_STATUS {
                    warn!(
                        kind = %self.profile.kind,
                        submission_id = %submission.id,
                        upload_id = %upload.id,
                        detail = %response.detail,
                        "Evidence upload status error"
                    );
                    self.silent_failure(
                        self.profile.service_tag,
                        "evidence submission to Lighthouse",
                    );
                }
                self.count(
                    &self.profile.metric("_upload.status"),
                    &[format!("status:{}", response.status)],
                );
            }

            let mut entry = response.stored_attributes();
            entry.insert("id".to_string(), Value::String(upload.id));
            outcome.entries.push(entry);
        }

        Ok(outcome)
    }

    /// Fetch and persist every open secondary form of a submission.
    ///
    /// Returns whether all of them reached a successful upload status.
    async fn refresh_secondary_forms(
        &self,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let forms = self.store.list_secondary_forms(&submission.id).await?;
        let mut all_complete = true;

        for form in forms.iter().filter(|f| !f.is_resolved()) {
            // An unreadable stored status is overwritten by this poll.
            let previous = match form.stored_status() {
                Ok(previous) => previous,
                Err(e) => {
                    warn!(
                        kind = %self.profile.kind,
                        submission_id = %submission.id,
                        form_id = %form.id,
                        error = %e,
                        "Stored secondary form status is unreadable"
                    );
                    None
                }
            };

            let response = match self
                .client
                .get_upload_status(self.profile.kind, &form.id)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    self.secondary_form_failed(submission, &form.id, &e.to_string());
                    all_complete = false;
                    continue;
                }
            };

            let successful = kinds::is_successful_upload_status(&response.status);
            if !successful {
                all_complete = false;
            }

            if previous.as_deref() != Some(response.status.as_str()) {
                if response.status == ERROR_STATUS {
                    warn!(
                        kind = %self.profile.kind,
                        submission_id = %submission.id,
                        form_id = %form.id,
                        "Secondary form status error"
                    );
                    self.silent_failure(
                        &format!("{}-4142", self.profile.service_tag),
                        "PDF submission to Lighthouse",
                    );
                }
                self.count(
                    &self.profile.metric("_secondary_form.status"),
                    &[format!("status:{}", response.status)],
                );
            }

            let delete_date = if successful {
                self.count(&self.profile.metric("_secondary_form.delete_date_update"), &[]);
                Some(now + retention_period())
            } else {
                None
            };

            let update = SecondaryFormStatusUpdate {
                status: serde_json::to_string(&Value::Object(response.stored_attributes()))?,
                status_updated_at: now,
                delete_date,
            };
            if let Err(e) = self
                .store
                .update_secondary_form_status(&form.id, &update)
                .await
            {
                self.secondary_form_failed(submission, &form.id, &e.to_string());
                all_complete = false;
            }
        }

        Ok(all_complete)
    }

    fn secondary_form_failed(&self, submission: &Submission, form_id: &str, message: &str) {
        warn!(
            kind = %self.profile.kind,
            submission_id = %submission.id,
            form_id = %form_id,
            error = %message,
            "Failed to refresh secondary form"
        );
        self.count(&self.profile.metric("_secondary_form.error"), &[]);
    }

    fn silent_failure(&self, service: &str, function: &str) {
        self.count(
            SILENT_FAILURE,
            &[
                format!("service:{}", service),
                format!("function: {}", function),
            ],
        );
    }

    fn count(&self, name: &str, tags: &[String]) {
        self.count_by(name, 1, tags);
    }

    fn count_by(&self, name: &str, by: u64, tags: &[String]) {
        self.metrics.increment(name, by, tags);
    }
}

/// Merge freshly fetched upload entries into the stored `uploads` array.
///
/// Entries are matched by `id`. Stored entries that were not fetched this
/// pass keep their last known value; new ids are appended.
fn merge_uploads(previous: Option<Value>, fetched: Vec<Map<String, Value>>) -> Value {
    let mut merged: Vec<Value> = match previous {
        Some(Value::Array(entries)) => entries,
        _ => Vec::new(),
    };

    for entry in fetched {
        let id = entry.get("id").cloned();
        let slot = merged
            .iter_mut()
            .find(|existing| id.is_some() && existing.get("id") == id.as_ref());
        match slot {
            Some(existing) => *existing = Value::Object(entry),
            None => merged.push(Value::Object(entry)),
        }
    }

    Value::Array(merged)
}
