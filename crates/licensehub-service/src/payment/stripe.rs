//! Stripe Checkout Sessions gateway.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use licensehub_core::config::PaymentConfig;
use licensehub_core::error::{AppError, ErrorKind};
use licensehub_core::result::AppResult;

use super::gateway::{CheckoutRequest, CheckoutSession, PaymentGateway, PaymentStatus};

/// Stripe gateway using the form-encoded REST API.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

/// Subset of the Stripe checkout session object that we read.
#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    payment_status: String,
    amount_total: Option<i64>,
    currency: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<StripeCustomerDetails>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomerDetails {
    email: Option<String>,
}

impl From<StripeSession> for CheckoutSession {
    fn from(s: StripeSession) -> Self {
        let email = s
            .metadata
            .get("email")
            .cloned()
            .or(s.customer_email)
            .or_else(|| s.customer_details.and_then(|d| d.email));
        Self {
            id: s.id,
            url: s.url,
            payment_status: PaymentStatus::parse(&s.payment_status),
            amount_total: s.amount_total,
            currency: s.currency,
            email,
            name: s.metadata.get("name").cloned(),
            hours: s.metadata.get("hours").and_then(|h| h.parse().ok()),
        }
    }
}

impl StripeGateway {
    /// Creates a new Stripe gateway.
    pub fn new(http: reqwest::Client, config: &PaymentConfig) -> Self {
        Self {
            http,
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn parse_response(response: reqwest::Response) -> AppResult<CheckoutSession> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "Stripe request failed");
            return Err(AppError::external_service(format!(
                "Payment provider returned {status}"
            )));
        }

        let session: StripeSession = response.json().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                "Malformed payment provider response",
                e,
            )
        })?;
        Ok(session.into())
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> AppResult<CheckoutSession> {
        let hours = request.quote.hours;
        let plural = if hours == 1 { "" } else { "s" };
        let form = [
            ("mode", "payment".to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("customer_email", request.email.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "line_items[0][price_data][currency]",
                request.quote.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.quote.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                format!("{} - {hours} hour{plural}", request.product_name),
            ),
            ("metadata[name]", request.name.clone()),
            ("metadata[email]", request.email.clone()),
            ("metadata[hours]", hours.to_string()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, Some(""))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Payment provider unreachable", e)
            })?;

        let session = Self::parse_response(response).await?;
        debug!(session_id = %session.id, hours, "Stripe checkout session created");
        Ok(session)
    }

    async fn retrieve(&self, session_id: &str) -> AppResult<CheckoutSession> {
        let well_formed = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !well_formed {
            return Err(AppError::validation("Invalid checkout session id"));
        }

        let response = self
            .http
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.api_base))
            .basic_auth(&self.secret_key, Some(""))
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Payment provider unreachable", e)
            })?;

        Self::parse_response(response).await
    }

    fn provider(&self) -> &'static str {
        "stripe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_conversion_prefers_metadata() {
        let raw = serde_json::json!({
            "id": "cs_test_123",
            "url": null,
            "payment_status": "paid",
            "amount_total": 1999,
            "currency": "usd",
            "customer_email": "other@example.com",
            "metadata": { "name": "Jane", "email": "jane@example.com", "hours": "2" }
        });
        let session: CheckoutSession = serde_json::from_value::<StripeSession>(raw)
            .unwrap()
            .into();
        assert_eq!(session.payment_status, PaymentStatus::Paid);
        assert_eq!(session.email.as_deref(), Some("jane@example.com"));
        assert_eq!(session.hours, Some(2));
        assert_eq!(session.amount_total, Some(1999));
    }

    #[test]
    fn test_session_conversion_falls_back_to_customer_details() {
        let raw = serde_json::json!({
            "id": "cs_test_456",
            "payment_status": "unpaid",
            "customer_details": { "email": "buyer@example.com" }
        });
        let session: CheckoutSession = serde_json::from_value::<StripeSession>(raw)
            .unwrap()
            .into();
        assert_eq!(session.payment_status, PaymentStatus::Unpaid);
        assert_eq!(session.email.as_deref(), Some("buyer@example.com"));
        assert_eq!(session.hours, None);
    }
}
