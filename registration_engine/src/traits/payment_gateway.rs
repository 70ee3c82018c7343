use chrono::{DateTime, Utc};
use cpg_common::Paise;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::db_types::{OrderId, PaymentId};

/// Payment states reported by the gateway. Only `Captured` settles an order; everything else is informational
/// as far as the reconciler is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Created,
    Authorized,
    Captured,
    Refunded,
    Failed,
    /// A state this engine has no opinion about. Never settles an order.
    Other,
}

/// A payment attempt as reported by the gateway. Amounts are in minor currency units, exactly as the gateway
/// sends them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Paise,
    pub status: GatewayPaymentStatus,
    pub method: Option<String>,
    pub error_reason: Option<String>,
    pub error_description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// The raw gateway entity, retained so the capture transition can store it for audit.
    pub raw: Option<Value>,
}

/// A payment intent on the gateway side, one per registration attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: OrderId,
    pub amount: Paise,
    pub amount_paid: Paise,
    pub status: String,
    pub receipt: Option<String>,
}

impl GatewayOrder {
    /// The paid-in-full condition used by the sweep's last-resort resolution step.
    pub fn is_fully_paid(&self) -> bool {
        self.amount_paid.value() > 0 && self.amount_paid == self.amount
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRefund {
    pub id: String,
    pub payment_id: PaymentId,
    pub amount: Paise,
    pub status: String,
}

/// Parameters for creating a gateway order.
#[derive(Debug, Clone)]
pub struct NewGatewayOrder {
    pub amount: Paise,
    pub currency: String,
    pub receipt: String,
}

/// The calls the engine issues to the payment gateway. Implemented by a thin REST adapter; the engine never sees
/// wire formats, only these objects.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayClient {
    async fn create_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, GatewayClientError>;

    async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<GatewayPayment, GatewayClientError>;

    /// All payment attempts recorded against the order, in gateway order.
    async fn payments_for_order(&self, order_id: &OrderId) -> Result<Vec<GatewayPayment>, GatewayClientError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<GatewayOrder, GatewayClientError>;

    async fn refund_payment(&self, payment_id: &PaymentId, amount: Paise)
        -> Result<GatewayRefund, GatewayClientError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayClientError {
    #[error("Could not reach the payment gateway: {0}")]
    Unreachable(String),
    #[error("The gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Could not interpret the gateway response: {0}")]
    InvalidResponse(String),
}
