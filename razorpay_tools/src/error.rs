use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RazorpayApiError {
    #[error("Could not initialize the Razorpay client. {0}")]
    Initialization(String),
    #[error("Error sending request to Razorpay. {0}")]
    RestResponseError(String),
    #[error("Could not deserialize the Razorpay response. {0}")]
    JsonError(String),
    #[error("Razorpay rejected the request ({status}): {message}")]
    QueryError { status: u16, message: String },
}
