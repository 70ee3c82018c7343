use cpg_common::Paise;
use razorpay_tools::{data_objects::PaymentState, RazorpayApi, RazorpayApiError, RazorpayOrder, RazorpayPayment};
use registration_engine::{
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

/// Binds the engine's gateway contract to the Razorpay REST client.
#[derive(Clone)]
pub struct RazorpayGateway {
    api: RazorpayApi,
}

impl RazorpayGateway {
    pub fn new(api: RazorpayApi) -> Self {
        Self { api }
    }
}

impl PaymentGatewayClient for RazorpayGateway {
    async fn create_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, GatewayClientError> {
        let created =
            self.api.create_order(order.amount.value(), &order.currency, &order.receipt).await.map_err(to_gateway_error)?;
        Ok(to_gateway_order(created))
    }

    async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<GatewayPayment, GatewayClientError> {
        let payment = self.api.get_payment(payment_id.as_str()).await.map_err(to_gateway_error)?;
        Ok(to_gateway_payment(payment))
    }

    async fn payments_for_order(&self, order_id: &OrderId) -> Result<Vec<GatewayPayment>, GatewayClientError> {
        let payments = self.api.payments_for_order(order_id.as_str()).await.map_err(to_gateway_error)?;
        Ok(payments.into_iter().map(to_gateway_payment).collect())
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<GatewayOrder, GatewayClientError> {
        let order = self.api.get_order(order_id.as_str()).await.map_err(to_gateway_error)?;
        Ok(to_gateway_order(order))
    }

    async fn refund_payment(
        &self,
        payment_id: &PaymentId,
        amount: Paise,
    ) -> Result<GatewayRefund, GatewayClientError> {
        let refund = self.api.refund_payment(payment_id.as_str(), amount.value()).await.map_err(to_gateway_error)?;
        Ok(GatewayRefund {
            id: refund.id,
            payment_id: PaymentId(refund.payment_id),
            amount: Paise::from(refund.amount),
            status: refund.status,
        })
    }
}

fn to_gateway_order(order: RazorpayOrder) -> GatewayOrder {
    GatewayOrder {
        id: OrderId(order.id),
        amount: Paise::from(order.amount),
        amount_paid: Paise::from(order.amount_paid),
        status: order.status,
        receipt: order.receipt,
    }
}

fn to_gateway_payment(payment: RazorpayPayment) -> GatewayPayment {
    // Keep the vendor entity verbatim; it ends up in the candidate's audit payload on capture.
    let raw = serde_json::to_value(&payment).ok();
    GatewayPayment {
        id: PaymentId(payment.id),
        order_id: OrderId(payment.order_id),
        amount: Paise::from(payment.amount),
        status: to_gateway_status(payment.status),
        method: payment.method,
        error_reason: payment.error_reason,
        error_description: payment.error_description,
        created_at: payment.created_at,
        raw,
    }
}

fn to_gateway_status(state: PaymentState) -> GatewayPaymentStatus {
    match state {
        PaymentState::Created => GatewayPaymentStatus::Created,
        PaymentState::Authorized => GatewayPaymentStatus::Authorized,
        PaymentState::Captured => GatewayPaymentStatus::Captured,
        PaymentState::Refunded => GatewayPaymentStatus::Refunded,
        PaymentState::Failed => GatewayPaymentStatus::Failed,
        PaymentState::Other => GatewayPaymentStatus::Other,
    }
}

fn to_gateway_error(e: RazorpayApiError) -> GatewayClientError {
    match e {
        RazorpayApiError::Initialization(m) | RazorpayApiError::RestResponseError(m) => {
            GatewayClientError::Unreachable(m)
        },
        RazorpayApiError::JsonError(m) => GatewayClientError::InvalidResponse(m),
        RazorpayApiError::QueryError { status, message } => GatewayClientError::Rejected { status, message },
    }
}
