//! Payment provider configuration.

use serde::{Deserialize, Serialize};

/// Which payment gateway to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    /// Stripe Checkout Sessions.
    Stripe,
    /// In-process gateway for development and tests.
    Mock,
}

/// Payment provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Provider selection.
    #[serde(default = "default_provider")]
    pub provider: PaymentProvider,
    /// Provider API secret key.
    #[serde(default)]
    pub secret_key: String,
    /// Webhook signing secret. Webhooks are rejected when empty.
    #[serde(default)]
    pub webhook_secret: String,
    /// Allowed clock skew for webhook timestamps, in seconds.
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_seconds: i64,
    /// Path appended to `server.public_url` for successful checkouts.
    #[serde(default = "default_success_path")]
    pub success_path: String,
    /// Path appended to `server.public_url` for cancelled checkouts.
    #[serde(default = "default_cancel_path")]
    pub cancel_path: String,
    /// Provider API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Outbound request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            secret_key: String::new(),
            webhook_secret: String::new(),
            webhook_tolerance_seconds: default_webhook_tolerance(),
            success_path: default_success_path(),
            cancel_path: default_cancel_path(),
            api_base: default_api_base(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_provider() -> PaymentProvider {
    PaymentProvider::Mock
}

fn default_webhook_tolerance() -> i64 {
    300
}

fn default_success_path() -> String {
    "/success".to_string()
}

fn default_cancel_path() -> String {
    "/cancel".to_string()
}

fn default_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_timeout() -> u64 {
    15
}
