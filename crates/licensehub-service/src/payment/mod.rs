//! Payment provider integration.

pub mod gateway;
pub mod mock;
pub mod stripe;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use licensehub_core::config::{AppConfig, PaymentProvider};
use licensehub_core::error::{AppError, ErrorKind};
use licensehub_core::result::AppResult;

pub use gateway::{CheckoutRequest, CheckoutSession, PaymentGateway, PaymentStatus};
pub use mock::MockGateway;
pub use stripe::StripeGateway;
pub use webhook::{WebhookError, WebhookVerifier};

/// Build the gateway named in configuration.
pub fn build_gateway(config: &AppConfig) -> AppResult<Arc<dyn PaymentGateway>> {
    match config.payment.provider {
        PaymentProvider::Stripe => {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.payment.timeout_seconds))
                .build()
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
                })?;
            Ok(Arc::new(StripeGateway::new(http, &config.payment)))
        }
        PaymentProvider::Mock => {
            tracing::warn!("Using mock payment gateway; checkouts are paid automatically");
            Ok(Arc::new(MockGateway::new(true)))
        }
    }
}
