// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-kind reconciliation profiles.
//!
//! Each [`SubmissionKind`] maps to a static [`KindProfile`] describing which
//! flag enables its reconciler, where its metrics go, and which child
//! artifacts it tracks.

use claimsync_core::SubmissionKind;

/// Upstream submission status that counts as resolved.
pub const SUCCESSFUL_STATUSES: &[&str] = &["complete"];

/// Upstream upload status that counts as resolved.
pub const UPLOAD_SUCCESSFUL_STATUSES: &[&str] = &["vbms"];

/// Upstream status reported for a terminal failure.
pub const ERROR_STATUS: &str = "error";

/// Flag that enables secondary form (21-4142) tracking.
pub const TRACK_SECONDARY_FORMS_FLAG: &str = "decision_review_track_4142_submissions";

/// Static reconciliation settings for one submission kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindProfile {
    /// The kind this profile describes.
    pub kind: SubmissionKind,
    /// Feature flag gating the whole reconciler for this kind.
    pub enable_flag: &'static str,
    /// Prefix of every counter emitted for this kind.
    pub metric_prefix: &'static str,
    /// `service:` tag used on silent-failure alerts.
    pub service_tag: &'static str,
    /// Whether submissions of this kind carry evidence uploads.
    pub tracks_evidence: bool,
    /// Whether submissions of this kind carry secondary forms.
    pub tracks_secondary_forms: bool,
}

const SUPPLEMENTAL_CLAIM: KindProfile = KindProfile {
    kind: SubmissionKind::SupplementalClaim,
    enable_flag: "decision_review_saved_claim_sc_status_updater_job_enabled",
    metric_prefix: "worker.decision_review.saved_claim_sc_status_updater",
    service_tag: "supplemental-claims",
    tracks_evidence: true,
    tracks_secondary_forms: true,
};

const HIGHER_LEVEL_REVIEW: KindProfile = KindProfile {
    kind: SubmissionKind::HigherLevelReview,
    enable_flag: "decision_review_saved_claim_hlr_status_updater_job_enabled",
    metric_prefix: "worker.decision_review.saved_claim_hlr_status_updater",
    service_tag: "higher-level-review",
    tracks_evidence: false,
    tracks_secondary_forms: false,
};

const NOTICE_OF_DISAGREEMENT: KindProfile = KindProfile {
    kind: SubmissionKind::NoticeOfDisagreement,
    enable_flag: "decision_review_saved_claim_nod_status_updater_job_enabled",
    metric_prefix: "worker.decision_review.saved_claim_nod_status_updater",
    service_tag: "board-appeal",
    tracks_evidence: true,
    tracks_secondary_forms: false,
};

/// Look up the profile of a kind.
pub fn profile(kind: SubmissionKind) -> &'static KindProfile {
    match kind {
        SubmissionKind::SupplementalClaim => &SUPPLEMENTAL_CLAIM,
        SubmissionKind::HigherLevelReview => &HIGHER_LEVEL_REVIEW,
        SubmissionKind::NoticeOfDisagreement => &NOTICE_OF_DISAGREEMENT,
    }
}

impl KindProfile {
    /// Counter name under this kind's prefix, e.g. `<prefix>.status`.
    pub fn metric(&self, suffix: &str) -> String {
        format!("{}{}", self.metric_prefix, suffix)
    }
}

/// Whether an upstream submission status resolves the submission.
pub fn is_successful_status(status: &str) -> bool {
    SUCCESSFUL_STATUSES.contains(&status)
}

/// Whether an upstream upload status resolves the upload.
pub fn is_successful_upload_status(status: &str) -> bool {
    UPLOAD_SUCCESSFUL_STATUSES.contains(&status)
}
