//! A minimal client for the Razorpay REST API, covering the calls the registration gateway needs: order
//! creation, payment lookup and listing, order lookup and refunds. Amounts are always in paise on this side of
//! the boundary, exactly as the API speaks them.
mod api;
mod config;
pub mod data_objects;
mod error;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{PaymentState, RazorpayOrder, RazorpayPayment, RazorpayRefund, WebhookEnvelope};
pub use error::RazorpayApiError;
