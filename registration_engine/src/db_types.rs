use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use cpg_common::Paise;
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
/// The authoritative payment state of a candidate record.
///
/// The only legal transitions are `Pending → Paid` and `Pending → Failed`. A `Paid` record is never downgraded,
/// no matter what signals arrive afterwards; every write that could transition this field is gated by a
/// conditional store update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// The registration order has been created, but no capture has been observed yet.
    Pending,
    /// The gateway has reported a captured payment for the registration order.
    Paid,
    /// The gateway reported a failed payment attempt while the record was still pending.
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------    SignalOrigin     ---------------------------------------------------------
/// Which of the three payment signal channels performed the most recent payment-state write.
/// Recorded for audit; the reconciliation logic itself is identical for all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SignalOrigin {
    /// The browser-initiated verification callback after checkout.
    ClientCallback,
    /// An asynchronous gateway webhook delivery.
    Webhook,
    /// The server-initiated polling/reconciliation sweep.
    Sweep,
}

impl Display for SignalOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalOrigin::ClientCallback => write!(f, "ClientCallback"),
            SignalOrigin::Webhook => write!(f, "Webhook"),
            SignalOrigin::Sweep => write!(f, "Sweep"),
        }
    }
}

impl FromStr for SignalOrigin {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ClientCallback" => Ok(Self::ClientCallback),
            "Webhook" => Ok(Self::Webhook),
            "Sweep" => Ok(Self::Sweep),
            s => Err(ConversionError(format!("Invalid signal origin: {s}"))),
        }
    }
}

//--------------------------------------    RefundStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum RefundStatus {
    #[default]
    None,
    Processed,
    Failed,
}

impl Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundStatus::None => write!(f, "None"),
            RefundStatus::Processed => write!(f, "Processed"),
            RefundStatus::Failed => write!(f, "Failed"),
        }
    }
}

//--------------------------------------     AdminAction     ---------------------------------------------------------
/// Operator decision recorded against a candidate. Orthogonal to the payment state; an accepted candidate is not
/// automatically paid, and a refund does not erase the payment history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum AdminAction {
    #[default]
    None,
    Accepted,
    Rejected,
    Refunded,
}

impl Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminAction::None => write!(f, "None"),
            AdminAction::Accepted => write!(f, "Accepted"),
            AdminAction::Rejected => write!(f, "Rejected"),
            AdminAction::Refunded => write!(f, "Refunded"),
        }
    }
}

//--------------------------------------  CandidateCategory  ---------------------------------------------------------
/// Registration category. Drives the fee and the notification template selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CandidateCategory {
    Student,
    Working,
}

impl Display for CandidateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateCategory::Student => write!(f, "Student"),
            CandidateCategory::Working => write!(f, "Working"),
        }
    }
}

impl FromStr for CandidateCategory {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Student" => Ok(Self::Student),
            "Working" => Ok(Self::Working),
            s => Err(ConversionError(format!("Invalid candidate category: {s}"))),
        }
    }
}

//--------------------------------------       OrderId       ---------------------------------------------------------
/// The gateway-assigned order id. One order id maps to at most one candidate record; it is the join key every
/// payment signal reconciles against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      PaymentId      ---------------------------------------------------------
/// The gateway-assigned payment id. Attached when a capture (or failed attempt) is observed; once a record is
/// `Paid` the attached id never changes again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct PaymentId(pub String);

impl From<String> for PaymentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PaymentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     PhoneNumber     ---------------------------------------------------------
/// A normalized WhatsApp number: always country-code prefixed (`91` + 10 digits).
/// Construct via [`crate::helpers::normalize_phone`]; raw strings from the database are trusted as already
/// normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct PhoneNumber(pub(crate) String);

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   AttendanceToken   ---------------------------------------------------------
/// Capability credential for the staff-facing scan endpoint. Generated lazily at self check-in, derived from the
/// record id, and stable for the record's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct AttendanceToken(pub String);

impl From<String> for AttendanceToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for AttendanceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AttendanceToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      Candidate      ---------------------------------------------------------
/// The aggregate root. Created at registration submission and mutated by the payment reconciler (payment facet),
/// the attendance tracker (attendance facet), the certificate pipeline (certificate facet) and operator decisions
/// (admin facet). Never hard-deleted by the engine.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: PhoneNumber,
    pub category: CandidateCategory,
    pub college: Option<String>,
    pub company: Option<String>,
    pub order_id: OrderId,
    pub receipt: String,
    pub amount: Paise,
    // payment facet
    pub payment_status: PaymentStatus,
    pub payment_id: Option<PaymentId>,
    pub payment_method: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_updated_by: Option<SignalOrigin>,
    pub payment_failure_reason: Option<String>,
    /// Raw gateway payment entity, stored verbatim for audit.
    pub gateway_payload: Option<Value>,
    // refund facet
    pub refund_status: RefundStatus,
    pub refund_amount: Option<Paise>,
    pub refund_id: Option<String>,
    pub refund_date: Option<DateTime<Utc>>,
    // attendance facet
    pub attendance: bool,
    pub attendance_date: Option<DateTime<Utc>>,
    pub admin_attendance: bool,
    pub admin_attendance_date: Option<DateTime<Utc>>,
    pub attendance_token: Option<AttendanceToken>,
    // certificate facet
    pub certificate_sent: bool,
    pub certificate_document_id: Option<String>,
    pub certificate_url: Option<String>,
    pub certificate_public_id: Option<String>,
    pub certificate_asset_id: Option<String>,
    pub certificate_size_bytes: Option<i64>,
    pub certificate_message_id: Option<String>,
    pub certificate_message_status: Option<String>,
    pub certificate_sent_date: Option<DateTime<Utc>>,
    pub certificate_sent_by: Option<String>,
    // admin facet
    pub admin_action: AdminAction,
    pub admin_action_date: Option<DateTime<Utc>>,
    pub admin_action_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// Certificate eligibility: checked in and paid up.
    pub fn is_eligible_for_certificate(&self) -> bool {
        self.attendance && self.payment_status == PaymentStatus::Paid
    }
}

//--------------------------------------     NewCandidate    ---------------------------------------------------------
/// A registration submission, ready for insertion. The gateway order must already exist; `order_id` binds the
/// record to it.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub name: String,
    pub email: String,
    pub phone: PhoneNumber,
    pub category: CandidateCategory,
    pub college: Option<String>,
    pub company: Option<String>,
    pub order_id: OrderId,
    pub receipt: String,
    pub amount: Paise,
    pub created_at: DateTime<Utc>,
}

impl NewCandidate {
    pub fn new(name: String, email: String, phone: PhoneNumber, category: CandidateCategory, order_id: OrderId, amount: Paise) -> Self {
        Self {
            name,
            email,
            phone,
            category,
            college: None,
            company: None,
            order_id,
            receipt: String::default(),
            amount,
            created_at: Utc::now(),
        }
    }

    pub fn with_receipt(mut self, receipt: String) -> Self {
        self.receipt = receipt;
        self
    }
}
