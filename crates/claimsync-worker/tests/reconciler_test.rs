// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Reconciliation pass tests.
//!
//! Each test runs the reconciler against an in-memory SQLite store, a
//! scripted claims-tracking client and a recording metrics sink.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use claimsync_core::persistence::SqliteStore;
use claimsync_core::{
    EvidenceUpload, SecondaryForm, Submission, SubmissionKind, SubmissionStatus, SubmissionStore,
};
use claimsync_worker::kinds::TRACK_SECONDARY_FORMS_FLAG;
use claimsync_worker::metrics::SILENT_FAILURE;
use claimsync_worker::{
    FlagSnapshot, MockClaimsClient, ReconcileReport, ReconcilerWorker, ReconcilerWorkerConfig,
    RecordingMetrics, RunLease, StaticFeatureFlags, StoreLease, SubmissionStatusReconciler,
};
use serde_json::{Value, json};

const SC_PREFIX: &str = "worker.decision_review.saved_claim_sc_status_updater";
const NOD_PREFIX: &str = "worker.decision_review.saved_claim_nod_status_updater";

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, minute, 0).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap()
}

struct Harness {
    store: Arc<SqliteStore>,
    client: MockClaimsClient,
    metrics: Arc<RecordingMetrics>,
}

impl Harness {
    async fn new() -> Self {
        Self {
            store: Arc::new(SqliteStore::in_memory().await.unwrap()),
            client: MockClaimsClient::new(),
            metrics: Arc::new(RecordingMetrics::new()),
        }
    }

    fn reconciler(&self, kind: SubmissionKind) -> SubmissionStatusReconciler {
        SubmissionStatusReconciler::new(
            kind,
            self.store.clone(),
            Arc::new(self.client.clone()),
            self.metrics.clone(),
        )
    }

    async fn submission(&self, id: &str, kind: SubmissionKind, minute: u32) {
        self.store
            .insert_submission(&Submission::new(id, kind, at(minute)))
            .await
            .unwrap();
    }

    async fn upload(&self, submission_id: &str, upload_id: &str) {
        self.store
            .insert_evidence_upload(&EvidenceUpload::new(upload_id, submission_id, at(0)))
            .await
            .unwrap();
    }

    async fn form(&self, submission_id: &str, form_id: &str) {
        self.store
            .insert_secondary_form(&SecondaryForm::new(form_id, submission_id, "21-4142", at(0)))
            .await
            .unwrap();
    }

    async fn get(&self, id: &str) -> Submission {
        self.store.get_submission(id).await.unwrap().unwrap()
    }

    async fn metadata(&self, id: &str) -> Value {
        let raw = self.get(id).await.metadata.expect("metadata written");
        serde_json::from_str(&raw).unwrap()
    }
}

fn metric(prefix: &str, suffix: &str) -> String {
    format!("{}{}", prefix, suffix)
}

// ============================================================================
// Retention decisions
// ============================================================================

#[tokio::test]
async fn test_complete_with_successful_upload_sets_retention() {
    let h = Harness::new().await;
    h.submission("s1", SubmissionKind::SupplementalClaim, 0).await;
    h.upload("s1", "u1").await;
    h.client.set_status("s1", "complete").await;
    h.client.set_upload_status("u1", "vbms", "").await;

    let report = h
        .reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    assert_eq!(
        report,
        ReconcileReport {
            processed: 1,
            completed: 1,
            failed: 0
        }
    );
    let s1 = h.get("s1").await;
    assert_eq!(s1.delete_date, Some(now() + Duration::days(59)));
    assert_eq!(s1.status, Some(SubmissionStatus::Complete));
    assert_eq!(s1.metadata_updated_at, Some(now()));
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, ".processing_records")), 1);
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, ".delete_date_update")), 1);
    assert_eq!(h.metrics.total(SILENT_FAILURE), 0);

    // Resolved submissions leave the open set.
    let second = h
        .reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;
    assert_eq!(second, ReconcileReport::default());
    assert_eq!(h.client.status_calls().await.len(), 1);
}

#[tokio::test]
async fn test_upload_error_blocks_retention_and_alerts_once() {
    let h = Harness::new().await;
    h.submission("s2", SubmissionKind::SupplementalClaim, 0).await;
    h.upload("s2", "u1").await;
    h.client.set_status("s2", "complete").await;
    h.client.set_upload_status("u1", "error", "Invalid PDF").await;

    let reconciler = h.reconciler(SubmissionKind::SupplementalClaim);
    reconciler
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    assert_eq!(h.get("s2").await.delete_date, None);
    assert_eq!(h.metrics.total(SILENT_FAILURE), 1);
    assert_eq!(
        h.metrics.total_tagged(
            SILENT_FAILURE,
            "function: evidence submission to Lighthouse"
        ),
        1
    );
    assert_eq!(
        h.metrics
            .total_tagged(SILENT_FAILURE, "service:supplemental-claims"),
        1
    );
    assert_eq!(
        h.metrics
            .total_tagged(&metric(SC_PREFIX, "_upload.status"), "status:error"),
        1
    );

    let uploads = h.metadata("s2").await["uploads"].clone();
    assert_eq!(uploads[0]["id"], "u1");
    assert_eq!(uploads[0]["status"], "error");
    assert_eq!(uploads[0]["detail"], "Invalid PDF");

    reconciler
        .run_once_at(&FlagSnapshot::enabled(), now() + Duration::hours(1))
        .await;
    assert_eq!(h.get("s2").await.delete_date, None);
    assert_eq!(h.metrics.total(SILENT_FAILURE), 1);
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, "_upload.status")), 1);
}

#[tokio::test]
async fn test_pending_submission_stays_open() {
    let h = Harness::new().await;
    h.submission("s3", SubmissionKind::SupplementalClaim, 0).await;
    h.client.set_status("s3", "pending").await;

    let report = h
        .reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    assert_eq!(report.completed, 0);
    let s3 = h.get("s3").await;
    assert_eq!(s3.delete_date, None);
    assert_eq!(s3.status, Some(SubmissionStatus::Pending));
    assert_eq!(h.metadata("s3").await["status"], "pending");
    assert_eq!(h.metrics.total(SILENT_FAILURE), 0);
    assert_eq!(
        h.metrics
            .total_tagged(&metric(SC_PREFIX, ".status"), "status:pending"),
        1
    );
}

#[tokio::test]
async fn test_submission_error_status_alerts_once() {
    let h = Harness::new().await;
    h.submission("s4", SubmissionKind::SupplementalClaim, 0).await;
    h.client.set_status("s4", "error").await;

    let reconciler = h.reconciler(SubmissionKind::SupplementalClaim);
    reconciler
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;
    reconciler
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    assert_eq!(h.get("s4").await.status, Some(SubmissionStatus::Error));
    assert_eq!(
        h.metrics
            .total_tagged(SILENT_FAILURE, "function: form submission to Lighthouse"),
        1
    );

    // The alert precedes the status-change counter.
    let names: Vec<String> = h
        .metrics
        .increments()
        .into_iter()
        .map(|i| i.name)
        .filter(|n| n == SILENT_FAILURE || n.ends_with(".status"))
        .collect();
    assert_eq!(
        names,
        vec![SILENT_FAILURE.to_string(), metric(SC_PREFIX, ".status")]
    );
}

#[tokio::test]
async fn test_in_flight_statuses_map_to_processing() {
    let h = Harness::new().await;
    h.submission("a", SubmissionKind::HigherLevelReview, 0).await;
    h.submission("b", SubmissionKind::HigherLevelReview, 1).await;
    h.client.set_status("a", "success").await;
    h.client.set_status("b", "caseReceived").await;

    h.reconciler(SubmissionKind::HigherLevelReview)
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    assert_eq!(h.get("a").await.status, Some(SubmissionStatus::Processing));
    assert_eq!(h.get("b").await.status, Some(SubmissionStatus::Unknown));
    assert_eq!(h.metadata("b").await["status"], "caseReceived");
}

// ============================================================================
// Idempotence and isolation
// ============================================================================

#[tokio::test]
async fn test_repeated_pass_is_idempotent() {
    let h = Harness::new().await;
    h.submission("s1", SubmissionKind::NoticeOfDisagreement, 0).await;
    h.upload("s1", "u1").await;
    h.client.set_status("s1", "processing").await;
    h.client.set_upload_status("u1", "processing", "").await;

    let reconciler = h.reconciler(SubmissionKind::NoticeOfDisagreement);
    reconciler
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;
    let after_first = h.get("s1").await;
    let emitted = h.metrics.increments().len();

    let later = now() + Duration::hours(1);
    reconciler
        .run_once_at(&FlagSnapshot::enabled(), later)
        .await;
    let after_second = h.get("s1").await;

    assert_eq!(after_first.status, after_second.status);
    assert_eq!(after_first.metadata, after_second.metadata);
    assert_eq!(after_first.delete_date, after_second.delete_date);
    assert_eq!(after_first.metadata_updated_at, Some(now()));
    assert_eq!(after_second.metadata_updated_at, Some(later));
    let new: Vec<String> = h.metrics.increments()[emitted..]
        .iter()
        .map(|i| i.name.clone())
        .collect();
    assert_eq!(new, vec![metric(NOD_PREFIX, ".processing_records")]);
}

#[tokio::test]
async fn test_failed_fetch_does_not_block_later_submissions() {
    let h = Harness::new().await;
    h.submission("a", SubmissionKind::SupplementalClaim, 0).await;
    h.submission("b", SubmissionKind::SupplementalClaim, 1).await;
    h.client.fail_status("a", "connection reset").await;
    h.client.set_status("b", "complete").await;

    let report = h
        .reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    assert_eq!(
        report,
        ReconcileReport {
            processed: 2,
            completed: 1,
            failed: 1
        }
    );
    assert_eq!(
        h.client.status_calls().await,
        vec!["a".to_string(), "b".to_string()]
    );

    let a = h.get("a").await;
    assert_eq!(a.metadata, None);
    assert_eq!(a.metadata_updated_at, None);
    assert!(h.get("b").await.is_resolved());
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, ".error")), 1);
}

#[tokio::test]
async fn test_malformed_metadata_is_isolated() {
    let h = Harness::new().await;
    let mut broken = Submission::new("broken", SubmissionKind::SupplementalClaim, at(0));
    broken.metadata = Some("[1, 2, 3]".to_string());
    h.store.insert_submission(&broken).await.unwrap();
    h.submission("ok", SubmissionKind::SupplementalClaim, 1).await;
    h.client.set_status("broken", "complete").await;
    h.client.set_status("ok", "pending").await;

    let report = h
        .reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    assert_eq!(report.failed, 1);
    assert_eq!(h.get("broken").await.metadata.as_deref(), Some("[1, 2, 3]"));
    assert_eq!(h.metadata("ok").await["status"], "pending");
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, ".error")), 1);
}

// ============================================================================
// Flags
// ============================================================================

#[tokio::test]
async fn test_disabled_flag_does_nothing() {
    let h = Harness::new().await;
    h.submission("s1", SubmissionKind::SupplementalClaim, 0).await;
    h.upload("s1", "u1").await;
    h.client.set_status("s1", "complete").await;

    let report = h
        .reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::disabled(), now())
        .await;

    assert_eq!(report, ReconcileReport::default());
    assert_eq!(h.client.total_calls().await, 0);
    assert!(h.metrics.increments().is_empty());
    assert_eq!(
        h.get("s1").await,
        Submission::new("s1", SubmissionKind::SupplementalClaim, at(0))
    );
}

#[tokio::test]
async fn test_empty_open_set_emits_nothing() {
    let h = Harness::new().await;

    let report = h
        .reconciler(SubmissionKind::NoticeOfDisagreement)
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    assert_eq!(report, ReconcileReport::default());
    assert!(h.metrics.increments().is_empty());
}

// ============================================================================
// Metadata merge
// ============================================================================

#[tokio::test]
async fn test_metadata_merge_is_additive() {
    let h = Harness::new().await;
    let mut existing = Submission::new("s1", SubmissionKind::HigherLevelReview, at(0));
    existing.metadata = Some(r#"{"status":"pending","legacy":"kept"}"#.to_string());
    h.store.insert_submission(&existing).await.unwrap();
    h.client
        .set_status_attributes(
            "s1",
            json!({"status": "processing", "updatedAt": "2025-03-02T11:00:00Z"}),
        )
        .await;

    h.reconciler(SubmissionKind::HigherLevelReview)
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    let metadata = h.metadata("s1").await;
    assert_eq!(metadata["status"], "processing");
    assert_eq!(metadata["legacy"], "kept");
    assert_eq!(metadata["updatedAt"], "2025-03-02T11:00:00Z");
    assert!(metadata.get("uploads").is_none());
}

#[tokio::test]
async fn test_failed_upload_fetch_keeps_last_known_entry() {
    let h = Harness::new().await;
    let mut existing = Submission::new("s1", SubmissionKind::SupplementalClaim, at(0));
    existing.metadata = Some(
        json!({
            "status": "complete",
            "uploads": [
                {"id": "u1", "status": "vbms"},
                {"id": "u2", "status": "pending"},
            ]
        })
        .to_string(),
    );
    h.store.insert_submission(&existing).await.unwrap();
    h.upload("s1", "u1").await;
    h.upload("s1", "u2").await;
    h.client.set_status("s1", "complete").await;
    h.client.fail_upload("u1", "timeout").await;
    h.client.set_upload_status("u2", "vbms", "").await;

    h.reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    assert_eq!(h.get("s1").await.delete_date, None);
    assert_eq!(
        h.client.upload_calls().await,
        vec!["u1".to_string(), "u2".to_string()]
    );
    let uploads = h.metadata("s1").await["uploads"].clone();
    assert_eq!(uploads[0]["id"], "u1");
    assert_eq!(uploads[0]["status"], "vbms");
    assert_eq!(uploads[1]["id"], "u2");
    assert_eq!(uploads[1]["status"], "vbms");
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, "_upload.fetch_error")), 1);
    // u2 changed from pending to vbms; the failed fetch emits no status.
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, "_upload.status")), 1);
    // Stored status did not change, so no status counter either.
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, ".status")), 0);
}

#[tokio::test]
async fn test_higher_level_review_ignores_evidence() {
    let h = Harness::new().await;
    h.submission("hlr", SubmissionKind::HigherLevelReview, 0).await;
    h.upload("hlr", "u1").await;
    h.client.set_status("hlr", "complete").await;

    let report = h
        .reconciler(SubmissionKind::HigherLevelReview)
        .run_once_at(&FlagSnapshot::all_enabled(), now())
        .await;

    assert_eq!(report.completed, 1);
    assert!(h.client.upload_calls().await.is_empty());
}

// ============================================================================
// Secondary forms
// ============================================================================

#[tokio::test]
async fn test_successful_secondary_form_gets_own_retention() {
    let h = Harness::new().await;
    h.submission("s1", SubmissionKind::SupplementalClaim, 0).await;
    h.form("s1", "f1").await;
    h.client.set_status("s1", "complete").await;
    h.client.set_upload_status("f1", "vbms", "").await;

    let report = h
        .reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::all_enabled(), now())
        .await;

    assert_eq!(report.completed, 1);
    let forms = h.store.list_secondary_forms("s1").await.unwrap();
    assert_eq!(forms[0].delete_date, Some(now() + Duration::days(59)));
    assert_eq!(forms[0].status_updated_at, Some(now()));
    assert_eq!(forms[0].stored_status().unwrap().as_deref(), Some("vbms"));
    assert!(h.get("s1").await.is_resolved());
    assert_eq!(
        h.metrics
            .total(&metric(SC_PREFIX, "_secondary_form.delete_date_update")),
        1
    );
    assert_eq!(
        h.metrics
            .total_tagged(&metric(SC_PREFIX, "_secondary_form.status"), "status:vbms"),
        1
    );
}

#[tokio::test]
async fn test_secondary_form_error_blocks_retention_and_alerts_once() {
    let h = Harness::new().await;
    h.submission("s1", SubmissionKind::SupplementalClaim, 0).await;
    h.form("s1", "f1").await;
    h.client.set_status("s1", "complete").await;
    h.client.set_upload_status("f1", "error", "Unreadable").await;

    let reconciler = h.reconciler(SubmissionKind::SupplementalClaim);
    reconciler
        .run_once_at(&FlagSnapshot::all_enabled(), now())
        .await;
    reconciler
        .run_once_at(&FlagSnapshot::all_enabled(), now() + Duration::hours(1))
        .await;

    assert_eq!(h.get("s1").await.delete_date, None);
    let forms = h.store.list_secondary_forms("s1").await.unwrap();
    assert_eq!(forms[0].delete_date, None);
    assert_eq!(forms[0].stored_status().unwrap().as_deref(), Some("error"));
    assert_eq!(
        h.metrics
            .total_tagged(SILENT_FAILURE, "service:supplemental-claims-4142"),
        1
    );
    assert_eq!(
        h.metrics
            .total_tagged(SILENT_FAILURE, "function: PDF submission to Lighthouse"),
        1
    );
}

#[tokio::test]
async fn test_secondary_forms_ignored_when_tracking_disabled() {
    let h = Harness::new().await;
    h.submission("s1", SubmissionKind::SupplementalClaim, 0).await;
    h.form("s1", "f1").await;
    h.client.set_status("s1", "complete").await;
    h.client.set_upload_status("f1", "error", "").await;

    let report = h
        .reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    assert_eq!(report.completed, 1);
    assert!(h.client.upload_calls().await.is_empty());
    let forms = h.store.list_secondary_forms("s1").await.unwrap();
    assert_eq!(forms[0].status, None);
}

#[tokio::test]
async fn test_failed_secondary_form_fetch_does_not_stop_other_forms() {
    let h = Harness::new().await;
    h.submission("s1", SubmissionKind::SupplementalClaim, 0).await;
    h.form("s1", "f1").await;
    h.form("s1", "f2").await;
    h.client.set_status("s1", "complete").await;
    h.client.fail_upload("f1", "timeout").await;
    h.client.set_upload_status("f2", "vbms", "").await;

    h.reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::all_enabled(), now())
        .await;

    assert_eq!(h.get("s1").await.delete_date, None);
    let forms = h.store.list_secondary_forms("s1").await.unwrap();
    let f2 = forms.iter().find(|f| f.id == "f2").unwrap();
    assert!(f2.is_resolved());
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, "_secondary_form.error")), 1);
}

#[tokio::test]
async fn test_upstream_uploads_attribute_does_not_replace_stored_uploads() {
    let h = Harness::new().await;
    let mut existing = Submission::new("s1", SubmissionKind::SupplementalClaim, at(0));
    existing.metadata = Some(
        json!({"status": "pending", "uploads": [{"id": "u1", "status": "error"}]}).to_string(),
    );
    h.store.insert_submission(&existing).await.unwrap();
    h.upload("s1", "u1").await;
    h.client
        .set_status_attributes("s1", json!({"status": "pending", "uploads": "n/a"}))
        .await;
    h.client.fail_upload("u1", "timeout").await;

    let reconciler = h.reconciler(SubmissionKind::SupplementalClaim);
    reconciler
        .run_once_at(&FlagSnapshot::enabled(), now())
        .await;

    let uploads = h.metadata("s1").await["uploads"].clone();
    assert_eq!(uploads, json!([{"id": "u1", "status": "error"}]));

    // Once the upload is readable again its unchanged error is not re-alerted.
    h.client.set_upload_status("u1", "error", "Invalid PDF").await;
    reconciler
        .run_once_at(&FlagSnapshot::enabled(), now() + Duration::hours(1))
        .await;

    assert_eq!(h.metrics.total(SILENT_FAILURE), 0);
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, "_upload.status")), 0);
    assert_eq!(h.metadata("s1").await["uploads"][0]["detail"], "Invalid PDF");
}

#[tokio::test]
async fn test_unreadable_secondary_form_status_is_overwritten() {
    let h = Harness::new().await;
    h.submission("s1", SubmissionKind::SupplementalClaim, 0).await;
    let mut form = SecondaryForm::new("f1", "s1", "21-4142", at(0));
    form.status = Some("not json".to_string());
    h.store.insert_secondary_form(&form).await.unwrap();
    h.client.set_status("s1", "complete").await;
    h.client.set_upload_status("f1", "vbms", "").await;

    let report = h
        .reconciler(SubmissionKind::SupplementalClaim)
        .run_once_at(&FlagSnapshot::all_enabled(), now())
        .await;

    assert_eq!(report.completed, 1);
    let forms = h.store.list_secondary_forms("s1").await.unwrap();
    assert!(forms[0].is_resolved());
    assert_eq!(forms[0].stored_status().unwrap().as_deref(), Some("vbms"));
    assert_eq!(h.metrics.total(&metric(SC_PREFIX, "_secondary_form.error")), 0);
    assert_eq!(
        h.metrics
            .total_tagged(&metric(SC_PREFIX, "_secondary_form.status"), "status:vbms"),
        1
    );
}

// ============================================================================
// Worker
// ============================================================================

fn worker(h: &Harness, flags: StaticFeatureFlags) -> ReconcilerWorker {
    ReconcilerWorker::new(
        h.reconciler(SubmissionKind::SupplementalClaim),
        Arc::new(flags),
        Arc::new(StoreLease::new(h.store.clone())),
        ReconcilerWorkerConfig::default(),
    )
}

#[tokio::test]
async fn test_tick_skips_when_lease_is_held_elsewhere() {
    let h = Harness::new().await;
    h.submission("s1", SubmissionKind::SupplementalClaim, 0).await;
    h.client.set_status("s1", "complete").await;

    let worker = worker(
        &h,
        StaticFeatureFlags::new([
            "decision_review_saved_claim_sc_status_updater_job_enabled",
            TRACK_SECONDARY_FORMS_FLAG,
        ]),
    );
    let other = StoreLease::new(h.store.clone());
    assert!(
        other
            .try_acquire(&worker.lease_name(), "other", StdDuration::from_secs(1800))
            .await
            .unwrap()
    );

    assert_eq!(worker.tick().await, None);
    assert_eq!(h.client.total_calls().await, 0);

    other.release(&worker.lease_name(), "other").await.unwrap();
    let report = worker.tick().await.unwrap();
    assert_eq!(report.completed, 1);

    // The lease was released after the pass.
    assert!(
        other
            .try_acquire(&worker.lease_name(), "other", StdDuration::from_secs(1800))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_tick_with_disabled_flag_fetches_nothing() {
    let h = Harness::new().await;
    h.submission("s1", SubmissionKind::SupplementalClaim, 0).await;

    let worker = worker(&h, StaticFeatureFlags::default());

    assert_eq!(worker.tick().await, Some(ReconcileReport::default()));
    assert_eq!(h.client.total_calls().await, 0);
    assert_eq!(worker.lease_name(), "reconciler:supplemental_claim");
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let h = Harness::new().await;
    let worker = Arc::new(worker(&h, StaticFeatureFlags::default()));
    let shutdown = worker.shutdown_handle();

    let task = tokio::spawn({
        let worker = worker.clone();
        async move { worker.run().await }
    });

    shutdown.notify_one();
    tokio::time::timeout(StdDuration::from_secs(5), task)
        .await
        .expect("worker stopped")
        .unwrap();
}
