use std::sync::Arc;

use log::{debug, info, trace};
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::RazorpayConfig,
    data_objects::{OrderRequest, PaymentCollection, RefundRequest},
    RazorpayApiError,
    RazorpayOrder,
    RazorpayPayment,
    RazorpayRefund,
};

#[derive(Clone)]
pub struct RazorpayApi {
    config: RazorpayConfig,
    client: Arc<Client>,
}

impl RazorpayApi {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RazorpayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &RazorpayConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, RazorpayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| RazorpayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| RazorpayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| RazorpayApiError::RestResponseError(e.to_string()))?;
            Err(RazorpayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Create a payment intent. `amount` is in paise.
    pub async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<RazorpayOrder, RazorpayApiError> {
        let body =
            OrderRequest { amount, currency: currency.to_string(), receipt: receipt.to_string() };
        debug!("Creating order for {amount} {currency} (receipt {receipt})");
        let order = self.rest_query::<RazorpayOrder, _>(Method::POST, "/orders", Some(body)).await?;
        info!("Created order {}", order.id);
        Ok(order)
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<RazorpayPayment, RazorpayApiError> {
        let path = format!("/payments/{payment_id}");
        debug!("Fetching payment {payment_id}");
        self.rest_query::<RazorpayPayment, ()>(Method::GET, &path, None).await
    }

    pub async fn payments_for_order(&self, order_id: &str) -> Result<Vec<RazorpayPayment>, RazorpayApiError> {
        let path = format!("/orders/{order_id}/payments");
        debug!("Listing payments for order {order_id}");
        let collection = self.rest_query::<PaymentCollection, ()>(Method::GET, &path, None).await?;
        debug!("Order {order_id} has {} payment attempts", collection.count);
        Ok(collection.items)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<RazorpayOrder, RazorpayApiError> {
        let path = format!("/orders/{order_id}");
        debug!("Fetching order {order_id}");
        self.rest_query::<RazorpayOrder, ()>(Method::GET, &path, None).await
    }

    /// Refund a captured payment. `amount` is in paise.
    pub async fn refund_payment(&self, payment_id: &str, amount: i64) -> Result<RazorpayRefund, RazorpayApiError> {
        let path = format!("/payments/{payment_id}/refund");
        let body = RefundRequest { amount, speed: "normal".to_string() };
        debug!("Refunding {amount} paise on payment {payment_id}");
        let refund = self.rest_query::<RazorpayRefund, _>(Method::POST, &path, Some(body)).await?;
        info!("Refund {} created for payment {payment_id}", refund.id);
        Ok(refund)
    }
}
