use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use registration_engine::{AttendanceError, CertificateError, ReconcileError, RegistrationError};
use thiserror::Error;

use crate::signature::SignatureError;

/// The server-level error taxonomy. Validation → 400, signature → 403, missing record → 404, upstream
/// (gateway/notification/storage service) → 502, everything internal → 500. Precondition no-ops never reach
/// this type; the engine reports them as successful outcomes.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("Signature verification failed. {0}")]
    SignatureError(#[from] SignatureError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("An upstream service call failed. {0}")]
    UpstreamError(String),
    #[error("This action is not allowed. {0}")]
    ActionForbidden(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::SignatureError(_) => StatusCode::FORBIDDEN,
            Self::ActionForbidden(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<ReconcileError> for ServerError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::Store(inner) => Self::BackendError(inner.to_string()),
            ReconcileError::Gateway(inner) => Self::UpstreamError(inner.to_string()),
            ReconcileError::OrderNotFound(_) | ReconcileError::CandidateNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
        }
    }
}

impl From<AttendanceError> for ServerError {
    fn from(e: AttendanceError) -> Self {
        match e {
            AttendanceError::InvalidPhone(_) => Self::ValidationError(e.to_string()),
            AttendanceError::NotRegistered => {
                Self::NoRecordFound("Number not registered. Please visit the enquiry counter.".to_string())
            },
            AttendanceError::PaymentIncomplete(_) => Self::ActionForbidden(e.to_string()),
            AttendanceError::UnknownToken => Self::NoRecordFound(e.to_string()),
            AttendanceError::NotCheckedIn => Self::ValidationError(e.to_string()),
            AttendanceError::Store(inner) => Self::BackendError(inner.to_string()),
        }
    }
}

impl From<CertificateError> for ServerError {
    fn from(e: CertificateError) -> Self {
        match e {
            CertificateError::CandidateNotFound(_) => Self::NoRecordFound(e.to_string()),
            CertificateError::NotEligible { .. } => Self::ValidationError(e.to_string()),
            CertificateError::Artifact(inner) => Self::UpstreamError(inner.to_string()),
            CertificateError::Delivery(inner) => Self::UpstreamError(inner.to_string()),
            CertificateError::Store(inner) => Self::BackendError(inner.to_string()),
        }
    }
}

impl From<RegistrationError> for ServerError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::Validation(_) | RegistrationError::InvalidPhone(_) => {
                Self::ValidationError(e.to_string())
            },
            RegistrationError::Gateway(inner) => Self::UpstreamError(inner.to_string()),
            RegistrationError::CandidateNotFound(_) => Self::NoRecordFound(e.to_string()),
            RegistrationError::NoRefundablePayment => Self::ValidationError(e.to_string()),
            RegistrationError::Store(inner) => Self::BackendError(inner.to_string()),
        }
    }
}
