use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::PhoneNumber;

/// Acknowledgement returned by the notification channel for a dispatched message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub message_id: String,
    pub status: String,
}

/// Templated message dispatch. Notification sends are best-effort: a failed send is logged and recorded, but it
/// never rolls back a state transition that has already been committed.
#[allow(async_fn_in_trait)]
pub trait NotificationChannel {
    /// Send a pre-approved template with positional parameters.
    async fn send_template(
        &self,
        to: &PhoneNumber,
        template_id: &str,
        params: &[String],
    ) -> Result<MessageReceipt, NotificationError>;

    /// Send a document by URL with a caption (used for certificate delivery).
    async fn send_document(
        &self,
        to: &PhoneNumber,
        document_url: &str,
        caption: &str,
    ) -> Result<MessageReceipt, NotificationError>;
}

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Could not reach the notification service: {0}")]
    Unreachable(String),
    #[error("The notification service rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Could not interpret the notification service response: {0}")]
    InvalidResponse(String),
}
