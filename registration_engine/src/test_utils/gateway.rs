use std::{collections::HashMap, sync::Arc};

use cpg_common::Paise;
use tokio::sync::RwLock;

use crate::{
    db_types::{OrderId, PaymentId},
    traits::{
        GatewayClientError,
        GatewayOrder,
        GatewayPayment,
        GatewayPaymentStatus,
        GatewayRefund,
        NewGatewayOrder,
        PaymentGatewayClient,
    },
};

#[derive(Default)]
struct Script {
    next_order: u64,
    orders: HashMap<OrderId, GatewayOrder>,
    payments: HashMap<PaymentId, GatewayPayment>,
    order_payments: HashMap<OrderId, Vec<GatewayPayment>>,
    refunds: Vec<GatewayRefund>,
}

/// A scriptable stand-in for the payment gateway. Tests stage orders and payments, then let the reconciler
/// discover them through the same resolution paths it uses in production.
#[derive(Default, Clone)]
pub struct ScriptedGateway {
    script: Arc<RwLock<Script>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a payment so it is visible both by payment id and in the order's payment list.
    pub async fn stage_payment(&self, payment: GatewayPayment) {
        let mut script = self.script.write().await;
        script.order_payments.entry(payment.order_id.clone()).or_default().push(payment.clone());
        script.payments.insert(payment.id.clone(), payment);
    }

    pub async fn stage_order(&self, order: GatewayOrder) {
        self.script.write().await.orders.insert(order.id.clone(), order);
    }

    pub async fn refunds_issued(&self) -> Vec<GatewayRefund> {
        self.script.read().await.refunds.clone()
    }

    pub fn captured(order_id: &OrderId, payment_id: &str, amount: Paise) -> GatewayPayment {
        GatewayPayment {
            id: PaymentId(payment_id.to_string()),
            order_id: order_id.clone(),
            amount,
            status: GatewayPaymentStatus::Captured,
            method: Some("upi".to_string()),
            error_reason: None,
            error_description: None,
            created_at: None,
            raw: None,
        }
    }
}

impl PaymentGatewayClient for ScriptedGateway {
    async fn create_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, GatewayClientError> {
        let mut script = self.script.write().await;
        script.next_order += 1;
        let created = GatewayOrder {
            id: OrderId(format!("order_test_{:04}", script.next_order)),
            amount: order.amount,
            amount_paid: Paise::from(0),
            status: "created".to_string(),
            receipt: Some(order.receipt),
        };
        script.orders.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<GatewayPayment, GatewayClientError> {
        self.script.read().await.payments.get(payment_id).cloned().ok_or(GatewayClientError::Rejected {
            status: 404,
            message: format!("payment {payment_id} not found"),
        })
    }

    async fn payments_for_order(&self, order_id: &OrderId) -> Result<Vec<GatewayPayment>, GatewayClientError> {
        Ok(self.script.read().await.order_payments.get(order_id).cloned().unwrap_or_default())
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<GatewayOrder, GatewayClientError> {
        self.script.read().await.orders.get(order_id).cloned().ok_or(GatewayClientError::Rejected {
            status: 404,
            message: format!("order {order_id} not found"),
        })
    }

    async fn refund_payment(
        &self,
        payment_id: &PaymentId,
        amount: Paise,
    ) -> Result<GatewayRefund, GatewayClientError> {
        let mut script = self.script.write().await;
        let refund = GatewayRefund {
            id: format!("rfnd_test_{}", script.refunds.len() + 1),
            payment_id: payment_id.clone(),
            amount,
            status: "processed".to_string(),
        };
        script.refunds.push(refund.clone());
        Ok(refund)
    }
}
