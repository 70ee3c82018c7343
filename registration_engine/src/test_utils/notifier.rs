use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    db_types::PhoneNumber,
    traits::{MessageReceipt, NotificationChannel, NotificationError},
};

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub template_id: Option<String>,
    pub document_url: Option<String>,
}

#[derive(Default)]
struct Log {
    sent: Vec<SentMessage>,
    fail_all: bool,
}

/// A notification channel that records every dispatch. Tests assert against the log to prove the
/// exactly-once notification property.
#[derive(Default, Clone)]
pub struct RecordingChannel {
    log: Arc<RwLock<Log>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail, to exercise the best-effort paths.
    pub async fn fail_all(&self) {
        self.log.write().await.fail_all = true;
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.log.read().await.sent.clone()
    }

    pub async fn count(&self) -> usize {
        self.log.read().await.sent.len()
    }
}

impl NotificationChannel for RecordingChannel {
    async fn send_template(
        &self,
        to: &PhoneNumber,
        template_id: &str,
        _params: &[String],
    ) -> Result<MessageReceipt, NotificationError> {
        let mut log = self.log.write().await;
        if log.fail_all {
            return Err(NotificationError::Rejected { status: 500, message: "scripted failure".to_string() });
        }
        log.sent.push(SentMessage {
            to: to.as_str().to_string(),
            template_id: Some(template_id.to_string()),
            document_url: None,
        });
        Ok(MessageReceipt { message_id: format!("msg_test_{}", log.sent.len()), status: "submitted".to_string() })
    }

    async fn send_document(
        &self,
        to: &PhoneNumber,
        document_url: &str,
        _caption: &str,
    ) -> Result<MessageReceipt, NotificationError> {
        let mut log = self.log.write().await;
        if log.fail_all {
            return Err(NotificationError::Rejected { status: 500, message: "scripted failure".to_string() });
        }
        log.sent.push(SentMessage {
            to: to.as_str().to_string(),
            template_id: None,
            document_url: Some(document_url.to_string()),
        });
        Ok(MessageReceipt { message_id: format!("msg_test_{}", log.sent.len()), status: "submitted".to_string() })
    }
}
