use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EVENT_PAYMENT_CAPTURED: &str = "payment.captured";
pub const EVENT_PAYMENT_FAILED: &str = "payment.failed";
pub const EVENT_REFUND_PROCESSED: &str = "refund.processed";
pub const EVENT_REFUND_FAILED: &str = "refund.failed";

/// The header carrying the webhook signature: an HMAC-SHA256 hex digest over the exact raw request body.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payment lifecycle states as Razorpay reports them. `Other` swallows states this client has no use for, so a
/// new gateway-side state never breaks deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Created,
    Authorized,
    Captured,
    Refunded,
    Failed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayPayment {
    pub id: String,
    pub order_id: String,
    pub amount: i64,
    pub currency: Option<String>,
    pub status: PaymentState,
    pub method: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub error_reason: Option<String>,
    pub error_description: Option<String>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCollection {
    pub count: i64,
    pub items: Vec<RazorpayPayment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundRequest {
    pub amount: i64,
    pub speed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayRefund {
    pub id: String,
    pub payment_id: String,
    pub amount: i64,
    pub currency: Option<String>,
    pub status: String,
}

//--------------------------------------   Webhook envelope  ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<EntityWrapper<RazorpayPayment>>,
    #[serde(default)]
    pub refund: Option<EntityWrapper<RazorpayRefund>>,
}

/// The webhook delivery envelope: `{event, payload: {payment|refund: {entity: {…}}}}`. The signature covers the
/// raw body, so this must only ever be parsed *after* verification.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

impl WebhookEnvelope {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// The raw payment entity from the envelope, for audit storage.
    pub fn raw_payment_entity(value: &Value) -> Option<Value> {
        let entity = value.get("payload")?.get("payment")?.get("entity")?;
        Some(entity.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CAPTURED_EVENT: &str = r#"{
        "entity": "event",
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": "pay_DESlfW9H8K9uqM",
                    "entity": "payment",
                    "amount": 50000,
                    "currency": "INR",
                    "status": "captured",
                    "order_id": "order_DESlLckIVRkHWj",
                    "method": "upi",
                    "email": "asha@example.com",
                    "contact": "+919876543210",
                    "error_reason": null,
                    "created_at": 1567674599
                }
            }
        }
    }"#;

    #[test]
    fn captured_event_parses() {
        let envelope: WebhookEnvelope = serde_json::from_str(CAPTURED_EVENT).unwrap();
        assert_eq!(envelope.event, EVENT_PAYMENT_CAPTURED);
        let payment = envelope.payload.payment.unwrap().entity;
        assert_eq!(payment.id, "pay_DESlfW9H8K9uqM");
        assert_eq!(payment.order_id, "order_DESlLckIVRkHWj");
        assert_eq!(payment.amount, 50000);
        assert_eq!(payment.status, PaymentState::Captured);
        assert_eq!(payment.method.as_deref(), Some("upi"));
    }

    #[test]
    fn raw_entity_is_extractable_for_audit() {
        let value: Value = serde_json::from_str(CAPTURED_EVENT).unwrap();
        let raw = WebhookEnvelope::raw_payment_entity(&value).unwrap();
        assert_eq!(raw["id"], "pay_DESlfW9H8K9uqM");
    }

    #[test]
    fn refund_event_parses() {
        let body = r#"{
            "event": "refund.processed",
            "payload": {
                "refund": {
                    "entity": {
                        "id": "rfnd_FgRAHdNOM4ZVbO",
                        "payment_id": "pay_DESlfW9H8K9uqM",
                        "amount": 50000,
                        "currency": "INR",
                        "status": "processed"
                    }
                }
            }
        }"#;
        let envelope: WebhookEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.event, EVENT_REFUND_PROCESSED);
        let refund = envelope.payload.refund.unwrap().entity;
        assert_eq!(refund.payment_id, "pay_DESlfW9H8K9uqM");
        assert_eq!(refund.status, "processed");
    }

    #[test]
    fn unknown_payment_states_do_not_break_parsing() {
        let json = r#"{"id": "pay_x", "order_id": "order_x", "amount": 100, "currency": "INR",
                       "status": "disputed", "method": null, "email": null, "contact": null,
                       "error_reason": null, "error_description": null, "created_at": null}"#;
        let payment: RazorpayPayment = serde_json::from_str(json).unwrap();
        assert_eq!(payment.status, PaymentState::Other);
    }

    #[test]
    fn unknown_events_still_carry_their_name() {
        let envelope: WebhookEnvelope = serde_json::from_str(r#"{"event": "invoice.paid", "payload": {}}"#).unwrap();
        assert_eq!(envelope.event, "invoice.paid");
        assert!(envelope.payload.payment.is_none());
        assert!(envelope.payload.refund.is_none());
    }
}
