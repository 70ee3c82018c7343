use std::{env, time::Duration};

use cpg_common::Secret;
use log::error;

const DEFAULT_API_URL: &str = "https://api.razorpay.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct RazorpayConfig {
    pub api_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
    /// The secret the gateway uses to sign asynchronous webhook deliveries. Distinct from the API key secret.
    pub webhook_secret: Secret<String>,
    /// Bound on every outbound call. Expiry surfaces as a retryable upstream failure, never as success.
    pub timeout: Duration,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            key_id: String::default(),
            key_secret: Secret::default(),
            webhook_secret: Secret::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RazorpayConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = env::var("CPG_RAZORPAY_API_URL").ok().unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let key_id = env::var("CPG_RAZORPAY_KEY_ID").ok().unwrap_or_else(|| {
            error!("🪛️ CPG_RAZORPAY_KEY_ID is not set. Please set it to your Razorpay key id.");
            String::default()
        });
        let key_secret = env::var("CPG_RAZORPAY_KEY_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ CPG_RAZORPAY_KEY_SECRET is not set. Please set it to your Razorpay key secret.");
            String::default()
        });
        let webhook_secret = env::var("CPG_RAZORPAY_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ CPG_RAZORPAY_WEBHOOK_SECRET is not set. Webhook deliveries cannot be verified without it."
            );
            String::default()
        });
        let timeout = env::var("CPG_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self {
            api_url,
            key_id,
            key_secret: Secret::new(key_secret),
            webhook_secret: Secret::new(webhook_secret),
            timeout,
        }
    }
}
