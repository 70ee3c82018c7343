//! Result objects returned by the engine APIs. These are the units the routes serialize and the test suite
//! asserts against.
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Candidate, PaymentId},
    dispatch::NotifyOutcome,
    traits::{MessageReceipt, StoredArtifact},
};

//--------------------------------------   Capture outcomes  ---------------------------------------------------------
/// What happened when a capture signal was applied. `AlreadyPaid` is the idempotent-replay case: the signal was
/// real, the effect had already happened, nothing was written and nothing was sent.
#[derive(Debug, Clone, Serialize)]
pub enum CaptureOutcome {
    Transitioned { candidate: Candidate, notification: NotifyOutcome },
    AlreadyPaid(Candidate),
}

impl CaptureOutcome {
    pub fn candidate(&self) -> &Candidate {
        match self {
            CaptureOutcome::Transitioned { candidate, .. } => candidate,
            CaptureOutcome::AlreadyPaid(candidate) => candidate,
        }
    }
}

/// What happened when a failed-payment signal was applied. `Ignored` carries the untouched record; a failure
/// signal never overrides a record that has left `Pending`.
#[derive(Debug, Clone, Serialize)]
pub enum FailureOutcome {
    Transitioned(Candidate),
    Ignored(Candidate),
}

/// Refund signals are keyed by payment id; a refund for a payment we never captured is acknowledged and dropped.
#[derive(Debug, Clone, Serialize)]
pub enum RefundOutcome {
    Updated(Candidate),
    UnknownPayment,
}

//--------------------------------------    Sweep summary    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepOutcome {
    UpdatedAndNotified,
    UpdatedNotificationFailed,
    AlreadyPaid,
    StillPending,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepRecord {
    pub candidate_id: i64,
    pub name: String,
    pub outcome: SweepOutcome,
    pub payment_id: Option<PaymentId>,
    pub error: Option<String>,
}

/// The structured result of one reconciliation sweep. Per-candidate records are retained for observability;
/// a failure on one candidate never aborts the rest.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub total_checked: usize,
    pub total_updated: usize,
    pub results: Vec<SweepRecord>,
}

impl SweepSummary {
    pub fn new(total_checked: usize) -> Self {
        Self { total_checked, total_updated: 0, results: Vec::with_capacity(total_checked) }
    }

    pub fn push(&mut self, record: SweepRecord) {
        if matches!(record.outcome, SweepOutcome::UpdatedAndNotified | SweepOutcome::UpdatedNotificationFailed) {
            self.total_updated += 1;
        }
        self.results.push(record);
    }
}

//--------------------------------------  Certificate batch  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Success,
    Failed,
    AlreadySent,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificateOutcome {
    pub candidate_id: i64,
    pub name: String,
    pub status: CertificateStatus,
    pub document_id: Option<String>,
    pub url: Option<String>,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

/// The structured summary of a certificate batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub already_sent: usize,
    pub results: Vec<CertificateOutcome>,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self { total, succeeded: 0, failed: 0, already_sent: 0, results: Vec::with_capacity(total) }
    }

    pub fn push_success(&mut self, candidate: &Candidate, document_id: String, url: String, message_id: String) {
        self.succeeded += 1;
        self.results.push(CertificateOutcome {
            candidate_id: candidate.id,
            name: candidate.name.clone(),
            status: CertificateStatus::Success,
            document_id: Some(document_id),
            url: Some(url),
            message_id: Some(message_id),
            error: None,
        });
    }

    pub fn push_failure(&mut self, candidate: &Candidate, error: String) {
        self.failed += 1;
        self.results.push(CertificateOutcome {
            candidate_id: candidate.id,
            name: candidate.name.clone(),
            status: CertificateStatus::Failed,
            document_id: None,
            url: None,
            message_id: None,
            error: Some(error),
        });
    }

    pub fn push_already_sent(&mut self, candidate: &Candidate) {
        self.already_sent += 1;
        self.results.push(CertificateOutcome {
            candidate_id: candidate.id,
            name: candidate.name.clone(),
            status: CertificateStatus::AlreadySent,
            document_id: candidate.certificate_document_id.clone(),
            url: candidate.certificate_url.clone(),
            message_id: candidate.certificate_message_id.clone(),
            error: None,
        });
    }
}

//--------------------------------------   Single issuance   ---------------------------------------------------------
/// The identifiers of a certificate that was replaced by a resend. Retained in the response as the audit trail
/// for the superseded document.
#[derive(Debug, Clone, Serialize)]
pub struct SupersededCertificate {
    pub document_id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub enum IssueResult {
    Issued {
        candidate: Candidate,
        document_id: String,
        artifact: StoredArtifact,
        receipt: MessageReceipt,
        superseded: Option<SupersededCertificate>,
    },
    AlreadySent(Candidate),
}

//--------------------------------------     Eligibility     ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct EligibilityReport {
    pub total: usize,
    pub certificates_sent: usize,
    pub pending_certificates: usize,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificateStats {
    pub total_eligible: i64,
    pub total_sent: i64,
    pub total_pending: i64,
}
