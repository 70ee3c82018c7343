use chrono::{DateTime, Utc};
use cpg_common::Paise;
use serde_json::Value;
use thiserror::Error;

use crate::db_types::{
    AdminAction,
    AttendanceToken,
    Candidate,
    NewCandidate,
    OrderId,
    PaymentId,
    PaymentStatus,
    PhoneNumber,
    RefundStatus,
    SignalOrigin,
};

/// The full payload of a capture transition. Applied atomically by [`CandidateStore::mark_paid_unless_paid`].
#[derive(Debug, Clone)]
pub struct PaymentCapture {
    pub payment_id: PaymentId,
    pub method: Option<String>,
    /// Raw gateway payment entity, stored for audit.
    pub payload: Option<Value>,
    pub origin: SignalOrigin,
    pub paid_at: DateTime<Utc>,
}

impl PaymentCapture {
    pub fn new(payment_id: PaymentId, origin: SignalOrigin) -> Self {
        Self { payment_id, method: None, payload: None, origin, paid_at: Utc::now() }
    }

    pub fn with_method<S: Into<String>>(mut self, method: S) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// The payload of a failure transition. Applied by [`CandidateStore::mark_failed_if_pending`].
#[derive(Debug, Clone)]
pub struct PaymentFailure {
    pub payment_id: PaymentId,
    pub reason: String,
    pub payload: Option<Value>,
}

/// A refund facet update, keyed by payment id.
#[derive(Debug, Clone)]
pub struct RefundUpdate {
    pub status: RefundStatus,
    pub amount: Option<Paise>,
    pub refund_id: Option<String>,
}

/// Artifact and delivery identifiers recorded after a successful certificate issuance.
#[derive(Debug, Clone)]
pub struct CertificateRecord {
    pub document_id: String,
    pub url: String,
    pub public_id: String,
    pub asset_id: String,
    pub size_bytes: i64,
    pub message_id: String,
    pub message_status: String,
    pub sent_by: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CertificateCounts {
    pub eligible: i64,
    pub sent: i64,
}

/// Lookup and update primitives over candidate records.
///
/// The `mark_*` methods are conditional writes: each one checks its precondition and applies the patch in a single
/// atomic statement, returning `None` when the precondition no longer holds. Callers must treat `None` as a silent
/// no-op, never as an error; this is what makes replayed and racing payment signals safe. Two concurrent signals
/// for the same order can both reach the store, but only one conditional write succeeds, and only that caller
/// performs the downstream side effects.
#[allow(async_fn_in_trait)]
pub trait CandidateStore {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError>;

    async fn fetch_candidate_by_id(&self, id: i64) -> Result<Option<Candidate>, StoreError>;

    async fn fetch_candidate_by_order_id(&self, order_id: &OrderId) -> Result<Option<Candidate>, StoreError>;

    async fn fetch_candidate_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Candidate>, StoreError>;

    async fn fetch_candidate_by_token(&self, token: &AttendanceToken) -> Result<Option<Candidate>, StoreError>;

    /// The most recently created record for the phone number, regardless of payment state.
    async fn fetch_latest_candidate_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Candidate>, StoreError>;

    /// The most recently created `Paid` record for the phone number. A person may register more than once; the
    /// newest paid registration wins.
    async fn fetch_latest_paid_candidate_by_phone(&self, phone: &PhoneNumber)
        -> Result<Option<Candidate>, StoreError>;

    /// All candidates, newest first, optionally filtered by payment status.
    async fn fetch_candidates(&self, status: Option<PaymentStatus>) -> Result<Vec<Candidate>, StoreError>;

    /// The reconciliation sweep working set: every `Pending` candidate.
    async fn fetch_pending_candidates(&self) -> Result<Vec<Candidate>, StoreError>;

    /// Certificate-eligible candidates (`attendance ∧ Paid`), optionally restricted to an explicit id list.
    async fn fetch_certificate_candidates(&self, ids: Option<&[i64]>) -> Result<Vec<Candidate>, StoreError>;

    async fn count_certificates(&self) -> Result<CertificateCounts, StoreError>;

    /// Transition to `Paid` unless the record is already `Paid`. This is the single capture transition used by
    /// all three signal channels. Returns the updated record, or `None` if the record was already paid (the
    /// caller must not notify in that case).
    async fn mark_paid_unless_paid(
        &self,
        order_id: &OrderId,
        capture: PaymentCapture,
    ) -> Result<Option<Candidate>, StoreError>;

    /// Transition to `Failed` only from `Pending`. A failed-payment signal must never override a paid record.
    async fn mark_failed_if_pending(
        &self,
        order_id: &OrderId,
        failure: PaymentFailure,
    ) -> Result<Option<Candidate>, StoreError>;

    /// Update the refund facet of the record holding this payment id. `None` if no record matches.
    async fn apply_refund(&self, payment_id: &PaymentId, refund: RefundUpdate)
        -> Result<Option<Candidate>, StoreError>;

    /// Set `attendance` if not already set. `None` means it was already marked; the caller must not update the
    /// attendance date or re-notify.
    async fn mark_attendance_if_unmarked(&self, id: i64) -> Result<Option<Candidate>, StoreError>;

    /// Set `admin_attendance` if not already set. The caller is responsible for checking that `attendance` was
    /// set first.
    async fn mark_admin_attendance_if_unmarked(&self, id: i64) -> Result<Option<Candidate>, StoreError>;

    /// Return the record with its attendance token populated, generating and persisting one if absent. The token
    /// is stable: once generated it is never regenerated.
    async fn ensure_attendance_token(&self, id: i64) -> Result<Candidate, StoreError>;

    async fn record_certificate(&self, id: i64, record: CertificateRecord) -> Result<Candidate, StoreError>;

    /// Record an operator decision. `actor` is the explicit caller identity, stored as an audit field.
    async fn record_admin_action(&self, id: i64, action: AdminAction, actor: &str) -> Result<Candidate, StoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("A candidate already exists for order {0}")]
    CandidateAlreadyExists(OrderId),
    #[error("The requested candidate (id {0}) does not exist")]
    CandidateNotFound(i64),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
