use cpg_common::Paise;
use mockall::mock;
use registration_engine::{
    db_types::{OrderId, PaymentId},
    traits::{
        GatewayClientError,
        GatewayOrder,
        GatewayPayment,
        GatewayRefund,
        NewGatewayOrder,
        PaymentGatewayClient,
    },
};

mock! {
    pub Gateway {}
    impl PaymentGatewayClient for Gateway {
        async fn create_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, GatewayClientError>;
        async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<GatewayPayment, GatewayClientError>;
        async fn payments_for_order(&self, order_id: &OrderId) -> Result<Vec<GatewayPayment>, GatewayClientError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<GatewayOrder, GatewayClientError>;
        async fn refund_payment(&self, payment_id: &PaymentId, amount: Paise) -> Result<GatewayRefund, GatewayClientError>;
    }
}
