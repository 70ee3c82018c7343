//! Contracts between the engine and its collaborators.
//!
//! The store trait is the serialization point for every state transition; the gateway, notification and artifact
//! traits describe the calls the engine issues to external services. Concrete implementations live outside the
//! engine (SQLite store excepted) and are injected into the API structs.
mod artifacts;
mod candidate_store;
mod notifications;
mod payment_gateway;

pub use artifacts::{ArtifactError, ArtifactStore, CertificateRenderer, StoredArtifact};
pub use candidate_store::{
    CandidateStore,
    CertificateCounts,
    CertificateRecord,
    PaymentCapture,
    PaymentFailure,
    RefundUpdate,
    StoreError,
};
pub use notifications::{MessageReceipt, NotificationChannel, NotificationError};
pub use payment_gateway::{
    GatewayClientError,
    GatewayOrder,
    GatewayPayment,
    GatewayPaymentStatus,
    GatewayRefund,
    NewGatewayOrder,
    PaymentGatewayClient,
};
