use thiserror::Error;

use crate::{
    db_types::{OrderId, PaymentStatus},
    helpers::PhoneFormatError,
    traits::{ArtifactError, GatewayClientError, NotificationError, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("The gateway could not be queried: {0}")]
    Gateway(#[from] GatewayClientError),
    #[error("No candidate is registered for order {0}")]
    OrderNotFound(OrderId),
    #[error("The requested candidate (id {0}) does not exist")]
    CandidateNotFound(i64),
}

#[derive(Debug, Clone, Error)]
pub enum AttendanceError {
    #[error(transparent)]
    InvalidPhone(#[from] PhoneFormatError),
    #[error("This number is not registered")]
    NotRegistered,
    #[error("Payment not completed ({0}); attendance cannot be marked")]
    PaymentIncomplete(PaymentStatus),
    #[error("No candidate matches the presented attendance token")]
    UnknownToken,
    #[error("The candidate has not completed self check-in")]
    NotCheckedIn,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum CertificateError {
    #[error("The requested candidate (id {0}) does not exist")]
    CandidateNotFound(i64),
    #[error("Candidate {name} is not eligible for a certificate (attendance: {attendance}, payment: {payment_status})")]
    NotEligible { name: String, attendance: bool, payment_status: PaymentStatus },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Could not deliver the certificate: {0}")]
    Delivery(#[from] NotificationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    InvalidPhone(#[from] PhoneFormatError),
    #[error("Could not create the gateway order: {0}")]
    Gateway(#[from] GatewayClientError),
    #[error("The requested candidate (id {0}) does not exist")]
    CandidateNotFound(i64),
    #[error("No eligible payment found for refund")]
    NoRefundablePayment,
    #[error(transparent)]
    Store(#[from] StoreError),
}
