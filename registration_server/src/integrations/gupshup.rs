use std::sync::Arc;

use log::{debug, trace};
use registration_engine::{
    db_types::PhoneNumber,
    traits::{MessageReceipt, NotificationChannel, NotificationError},
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::GupshupConfig;

#[derive(Debug, Deserialize)]
struct GupshupResponse {
    status: Option<String>,
    #[serde(rename = "messageId")]
    message_id: Option<String>,
}

/// WhatsApp delivery through the Gupshup messaging API.
#[derive(Clone)]
pub struct GupshupChannel {
    config: GupshupConfig,
    client: Arc<Client>,
}

impl GupshupChannel {
    pub fn new(config: GupshupConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotificationError::Unreachable(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    async fn post_form(&self, path: &str, form: &[(&str, String)]) -> Result<MessageReceipt, NotificationError> {
        let url = format!("{}{path}", self.config.api_url);
        trace!("Posting message to {url}");
        let response = self
            .client
            .post(url)
            .header("apikey", self.config.api_key.reveal())
            .form(form)
            .send()
            .await
            .map_err(|e| NotificationError::Unreachable(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected { status, message });
        }
        let parsed: GupshupResponse =
            response.json().await.map_err(|e| NotificationError::InvalidResponse(e.to_string()))?;
        Ok(MessageReceipt {
            message_id: parsed.message_id.unwrap_or_else(|| "unknown".to_string()),
            status: parsed.status.unwrap_or_else(|| "submitted".to_string()),
        })
    }
}

impl NotificationChannel for GupshupChannel {
    async fn send_template(
        &self,
        to: &PhoneNumber,
        template_id: &str,
        params: &[String],
    ) -> Result<MessageReceipt, NotificationError> {
        debug!("Sending template {template_id} to {to}");
        let template = json!({ "id": template_id, "params": params }).to_string();
        let form = [
            ("channel", "whatsapp".to_string()),
            ("source", self.config.source.clone()),
            ("destination", to.as_str().to_string()),
            ("src.name", self.config.app_name.clone()),
            ("template", template),
        ];
        self.post_form("/template/msg", &form).await
    }

    async fn send_document(
        &self,
        to: &PhoneNumber,
        document_url: &str,
        caption: &str,
    ) -> Result<MessageReceipt, NotificationError> {
        debug!("Sending document to {to}");
        let message = json!({ "type": "file", "url": document_url, "caption": caption }).to_string();
        let form = [
            ("channel", "whatsapp".to_string()),
            ("source", self.config.source.clone()),
            ("destination", to.as_str().to_string()),
            ("src.name", self.config.app_name.clone()),
            ("message", message),
        ];
        self.post_form("/msg", &form).await
    }
}
