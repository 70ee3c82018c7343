//! The signature verifier for gateway-issued messages.
//!
//! Two canonicalizations are in play. The client verification callback is signed over
//! `"{order_id}|{payment_id}"` with the API key secret; asynchronous webhook deliveries are signed over the
//! exact raw request body with the dedicated webhook secret. Both use HMAC-SHA256 hex digests, compared in
//! constant time. A missing signature or an unconfigured secret is always a verification failure; the server
//! fails closed rather than skipping the check.
use std::fmt::Write as _;

use cpg_common::Secret;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    #[error("No signature was provided")]
    MissingSignature,
    #[error("The signature does not match the payload")]
    InvalidSignature,
    #[error("No signing secret is configured")]
    MissingSecret,
}

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Secret<String>,
}

impl SignatureVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// The expected hex digest for a message. Fails if no secret is configured.
    pub fn sign(&self, message: &[u8]) -> Result<String, SignatureError> {
        if self.secret.is_empty() {
            return Err(SignatureError::MissingSecret);
        }
        let mut mac = HmacSha256::new_from_slice(self.secret.reveal().as_bytes())
            .map_err(|_| SignatureError::MissingSecret)?;
        mac.update(message);
        let digest = mac.finalize().into_bytes();
        let hex = digest.iter().fold(String::with_capacity(64), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        });
        Ok(hex)
    }

    pub fn verify(&self, message: &[u8], supplied: &str) -> Result<(), SignatureError> {
        let supplied = supplied.trim();
        if supplied.is_empty() {
            return Err(SignatureError::MissingSignature);
        }
        let expected = self.sign(message)?;
        if constant_time_eq(expected.as_bytes(), supplied.as_bytes()) {
            Ok(())
        } else {
            Err(SignatureError::InvalidSignature)
        }
    }
}

/// Verifies client payment-verification callbacks, which sign the order and payment ids rather than a body.
#[derive(Clone)]
pub struct CallbackVerifier(SignatureVerifier);

impl CallbackVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self(SignatureVerifier::new(secret))
    }

    pub fn verify(&self, order_id: &str, payment_id: &str, supplied: &str) -> Result<(), SignatureError> {
        let message = format!("{order_id}|{payment_id}");
        self.0.verify(message.as_bytes(), supplied)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
