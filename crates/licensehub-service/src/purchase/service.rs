//! Purchase orchestration.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use licensehub_core::config::{AdminConfig, AppConfig};
use licensehub_core::error::AppError;
use licensehub_core::result::AppResult;
use licensehub_entity::license::License;
use licensehub_entity::order::Quote;

use crate::email::{mask_email, normalize_email};
use crate::license::{LicenseError, LicenseManager};
use crate::mail::{LicenseEmail, LicenseMailer};
use crate::payment::{CheckoutRequest, PaymentGateway, PaymentStatus, WebhookVerifier};

use super::pricing::PriceList;

/// Longest accepted buyer name.
const MAX_NAME_LEN: usize = 100;
/// Event type that confirms a purchase.
const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// A buyer's request to purchase usage hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Buyer's name.
    pub name: String,
    /// Buyer's e-mail.
    pub email: String,
    /// Hours to purchase; must be in the price list.
    pub hours: u32,
}

/// Result of starting a purchase.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// Admin e-mail: a license was granted without payment.
    Granted {
        /// The granted license.
        license: License,
        /// Whether the license e-mail went out.
        email_sent: bool,
    },
    /// The buyer must complete a hosted checkout.
    Checkout {
        /// Provider session id.
        session_id: String,
        /// Hosted checkout page.
        checkout_url: String,
        /// Price charged.
        quote: Quote,
    },
}

/// Result of confirming a checkout.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedPurchase {
    /// The license for the order.
    pub license: License,
    /// `false` when the order had already been confirmed.
    pub newly_issued: bool,
    /// Whether a license e-mail went out during this call.
    pub email_sent: bool,
}

/// Result of handling a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// A purchase was confirmed (or had been already).
    Processed {
        /// Order id of the purchase.
        order_id: String,
        /// Whether this delivery issued the license.
        newly_issued: bool,
    },
    /// The event is not one we act on.
    Ignored {
        /// Provider event type.
        event_type: String,
    },
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
struct WebhookEventData {
    object: serde_json::Value,
}

/// Checkout return URLs.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    success_base: String,
    cancel: String,
}

impl CheckoutUrls {
    /// Build from `server.public_url` and the payment paths.
    pub fn from_config(config: &AppConfig) -> Self {
        let base = config.server.public_url.trim_end_matches('/');
        Self {
            success_base: format!("{base}{}", config.payment.success_path),
            cancel: format!("{base}{}", config.payment.cancel_path),
        }
    }

    /// Success URL for a purchase of `hours`. The provider substitutes
    /// `{CHECKOUT_SESSION_ID}`.
    pub fn success_url(&self, hours: u32) -> String {
        format!(
            "{}?session_id={{CHECKOUT_SESSION_ID}}&hours={hours}",
            self.success_base
        )
    }

    /// Cancel URL.
    pub fn cancel_url(&self) -> &str {
        &self.cancel
    }
}

/// Turns purchase requests and confirmed payments into licenses.
#[derive(Debug, Clone)]
pub struct PurchaseService {
    /// License lifecycle manager.
    licenses: Arc<LicenseManager>,
    /// Payment provider.
    gateway: Arc<dyn PaymentGateway>,
    /// License e-mail sender.
    mailer: Arc<dyn LicenseMailer>,
    /// Server-side prices.
    prices: PriceList,
    /// Admin allowlist.
    admin: AdminConfig,
    /// Checkout return URLs.
    urls: CheckoutUrls,
    /// Webhook signature check.
    verifier: WebhookVerifier,
}

impl PurchaseService {
    /// Creates a new purchase service.
    pub fn new(
        config: &AppConfig,
        licenses: Arc<LicenseManager>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn LicenseMailer>,
    ) -> Self {
        Self {
            licenses,
            gateway,
            mailer,
            prices: PriceList::new(config.pricing.clone()),
            admin: config.admin.clone(),
            urls: CheckoutUrls::from_config(config),
            verifier: WebhookVerifier::new(
                config.payment.webhook_secret.clone(),
                config.payment.webhook_tolerance_seconds,
            ),
        }
    }

    /// The price list.
    pub fn prices(&self) -> &PriceList {
        &self.prices
    }

    /// Validate a purchase and either grant directly (admin e-mails) or
    /// open a checkout.
    pub async fn start(&self, request: &PurchaseRequest) -> AppResult<PurchaseOutcome> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::validation("Name is too long"));
        }
        let email = normalize_email(&request.email).map_err(AppError::validation)?;
        let quote = self.prices.quote(request.hours)?;

        if self.admin.is_admin_email(&email) {
            info!(email = %mask_email(&email), hours = quote.hours, "Admin purchase; granting without payment");
            let license = self
                .licenses
                .grant(&email, Duration::seconds(quote.allotted_seconds()))
                .await?;
            let email_sent = self
                .deliver(&license, name, hours_phrase(quote.hours, "access"))
                .await;
            return Ok(PurchaseOutcome::Granted {
                license,
                email_sent,
            });
        }

        let checkout = CheckoutRequest {
            name: name.to_string(),
            email: email.clone(),
            quote: quote.clone(),
            product_name: self.prices.product_name().to_string(),
            success_url: self.urls.success_url(quote.hours),
            cancel_url: self.urls.cancel_url().to_string(),
        };
        let session = self.gateway.create_checkout(&checkout).await?;
        let checkout_url = session
            .url
            .clone()
            .ok_or_else(|| AppError::external_service("Payment provider returned no checkout URL"))?;

        info!(
            session_id = %session.id,
            email = %mask_email(&email),
            hours = quote.hours,
            provider = self.gateway.provider(),
            "Checkout started"
        );
        Ok(PurchaseOutcome::Checkout {
            session_id: session.id,
            checkout_url,
            quote,
        })
    }

    /// Confirm a completed checkout and issue its license.
    ///
    /// Confirming the same session again returns the license issued the
    /// first time; no second license is ever created for an order.
    pub async fn confirm(&self, session_id: &str) -> AppResult<ConfirmedPurchase> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(AppError::validation("session_id is required"));
        }

        if let Some(existing) = self.licenses.find_by_order(session_id).await? {
            debug!(session_id, "Checkout already confirmed");
            return Ok(ConfirmedPurchase {
                license: existing,
                newly_issued: false,
                email_sent: false,
            });
        }

        let session = self.gateway.retrieve(session_id).await?;
        if session.payment_status != PaymentStatus::Paid {
            warn!(session_id, status = %session.payment_status, "Checkout not paid");
            return Err(AppError::license("Payment has not been completed"));
        }

        let hours = session
            .hours
            .ok_or_else(|| AppError::license("Checkout session does not record purchased hours"))?;
        let amount = session.amount_total.unwrap_or_default();
        let currency = session.currency.as_deref().unwrap_or_default();
        if !self.prices.matches(hours, amount, currency) {
            warn!(session_id, hours, amount, currency, "Paid amount does not match price list");
            return Err(AppError::license(
                "Paid amount does not match the price for this package",
            ));
        }
        let quote = self.prices.quote(hours)?;

        let email = session
            .email
            .as_deref()
            .ok_or_else(|| AppError::license("Checkout session has no customer e-mail"))?;
        let name = session.name.as_deref().unwrap_or("Customer");

        match self
            .licenses
            .issue(email, Duration::seconds(quote.allotted_seconds()), &session.id)
            .await
        {
            Ok(license) => {
                let email_sent = self
                    .deliver(&license, name, hours_phrase(hours, "usage"))
                    .await;
                Ok(ConfirmedPurchase {
                    license,
                    newly_issued: true,
                    email_sent,
                })
            }
            Err(LicenseError::DuplicateOrder { order_id }) => {
                // Lost a race with a concurrent confirmation of the same order.
                let license = self
                    .licenses
                    .find_by_order(&order_id)
                    .await?
                    .ok_or_else(|| AppError::internal("Order license disappeared"))?;
                Ok(ConfirmedPurchase {
                    license,
                    newly_issued: false,
                    email_sent: false,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record that a buyer abandoned checkout. Nothing is persisted.
    pub fn cancel(&self, session_id: Option<&str>) {
        info!(session_id = session_id.unwrap_or("-"), "Checkout cancelled by buyer");
    }

    /// Verify and handle a provider webhook delivery.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> AppResult<WebhookOutcome> {
        let signature =
            signature.ok_or_else(|| AppError::authentication("Missing webhook signature"))?;
        self.verifier
            .verify(signature, payload, self.licenses.now())
            .map_err(|e| {
                warn!(error = %e, "Webhook signature rejected");
                AppError::authentication(format!("Invalid webhook signature: {e}"))
            })?;

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| AppError::validation(format!("Malformed webhook payload: {e}")))?;

        if event.event_type != CHECKOUT_COMPLETED {
            debug!(event_type = %event.event_type, "Ignoring webhook event");
            return Ok(WebhookOutcome::Ignored {
                event_type: event.event_type,
            });
        }

        let object = &event.data.object;
        if object.get("payment_status").and_then(|v| v.as_str()) != Some("paid") {
            debug!("Checkout completed without payment yet; waiting for a later event");
            return Ok(WebhookOutcome::Ignored {
                event_type: event.event_type,
            });
        }
        let session_id = object
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::validation("Webhook event has no session id"))?;

        let confirmed = self.confirm(session_id).await?;
        Ok(WebhookOutcome::Processed {
            order_id: confirmed.license.order_id,
            newly_issued: confirmed.newly_issued,
        })
    }

    async fn deliver(&self, license: &License, name: &str, allotment: String) -> bool {
        let message = LicenseEmail {
            to_email: license.email.clone(),
            to_name: name.to_string(),
            license_key: license.key.clone(),
            order_id: license.order_id.clone(),
            allotment,
        };
        match self.mailer.send_license(&message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    order_id = %license.order_id,
                    provider = self.mailer.provider(),
                    error = %e,
                    "License e-mail failed; license remains issued"
                );
                false
            }
        }
    }
}

fn hours_phrase(hours: u32, what: &str) -> String {
    let plural = if hours == 1 { "" } else { "s" };
    format!("{hours} hour{plural} of {what}")
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use licensehub_core::traits::SystemClock;
    use licensehub_database::store::MemoryLicenseStore;
    use licensehub_entity::license::{LicenseKind, LicenseStatus};

    use super::*;
    use crate::mail::LogMailer;
    use crate::payment::{CheckoutSession, MockGateway};

    #[derive(Debug)]
    struct FailingMailer;

    #[async_trait]
    impl LicenseMailer for FailingMailer {
        async fn send_license(&self, _email: &LicenseEmail) -> AppResult<()> {
            Err(AppError::external_service("smtp down"))
        }

        fn provider(&self) -> &'static str {
            "failing"
        }
    }

    struct Fixture {
        service: PurchaseService,
        gateway: MockGateway,
        mailer: LogMailer,
        config: AppConfig,
    }

    fn fixture() -> Fixture {
        let mut config = AppConfig::default();
        config.admin.emails = vec!["owner@example.com".to_string()];
        config.payment.webhook_secret = "whsec_test".to_string();
        build(config, Arc::new(LogMailer::new()))
    }

    fn build(config: AppConfig, mailer: Arc<LogMailer>) -> Fixture {
        let manager = Arc::new(LicenseManager::new(
            Arc::new(MemoryLicenseStore::new()),
            Arc::new(SystemClock),
            config.license.clone(),
        ));
        let gateway = MockGateway::new(false);
        let service = PurchaseService::new(
            &config,
            manager,
            Arc::new(gateway.clone()),
            mailer.clone(),
        );
        Fixture {
            service,
            gateway,
            mailer: (*mailer).clone(),
            config,
        }
    }

    fn request(email: &str, hours: u32) -> PurchaseRequest {
        PurchaseRequest {
            name: "Jane".to_string(),
            email: email.to_string(),
            hours,
        }
    }

    async fn open_checkout(f: &Fixture) -> String {
        match f.service.start(&request("jane@example.com", 2)).await.unwrap() {
            PurchaseOutcome::Checkout { session_id, .. } => session_id,
            other => panic!("expected checkout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_validates_input() {
        let f = fixture();
        let err = f.service.start(&request("jane@gmial.com", 1)).await.unwrap_err();
        assert_eq!(err.message, "Did you mean jane@gmail.com?");

        assert!(f.service.start(&request("jane@example.com", 7)).await.is_err());

        let mut blank = request("jane@example.com", 1);
        blank.name = "  ".to_string();
        assert!(f.service.start(&blank).await.is_err());
    }

    #[tokio::test]
    async fn test_checkout_url_carries_hours() {
        let f = fixture();
        let outcome = f.service.start(&request("jane@example.com", 3)).await.unwrap();
        match outcome {
            PurchaseOutcome::Checkout {
                checkout_url,
                quote,
                session_id,
            } => {
                assert_eq!(quote.amount_cents, 2999);
                assert!(checkout_url.contains(&session_id));
                assert!(checkout_url.ends_with("&hours=3"));
            }
            other => panic!("expected checkout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_admin_email_bypasses_payment() {
        let f = fixture();
        let outcome = f.service.start(&request("Owner@Example.com", 2)).await.unwrap();
        match outcome {
            PurchaseOutcome::Granted { license, email_sent } => {
                assert_eq!(license.kind, LicenseKind::AdminGrant);
                assert_eq!(license.allotted_seconds, 7200);
                assert!(license.order_id.starts_with("ADMIN_"));
                assert!(email_sent);
            }
            other => panic!("expected grant, got {other:?}"),
        }
        assert_eq!(f.mailer.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_requires_payment() {
        let f = fixture();
        let session_id = open_checkout(&f).await;
        let err = f.service.confirm(&session_id).await.unwrap_err();
        assert_eq!(err.kind, licensehub_core::error::ErrorKind::License);
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent() {
        let f = fixture();
        let session_id = open_checkout(&f).await;
        f.gateway.mark_paid(&session_id);

        let first = f.service.confirm(&session_id).await.unwrap();
        assert!(first.newly_issued);
        assert!(first.email_sent);
        assert_eq!(first.license.order_id, session_id);
        assert_eq!(first.license.allotted_seconds, 7200);
        assert_eq!(first.license.status, LicenseStatus::Active);

        let second = f.service.confirm(&session_id).await.unwrap();
        assert!(!second.newly_issued);
        assert_eq!(second.license.key, first.license.key);
        assert_eq!(f.mailer.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_rejects_tampered_amount() {
        let f = fixture();
        f.gateway.insert(CheckoutSession {
            id: "cs_cheap".to_string(),
            url: None,
            payment_status: PaymentStatus::Paid,
            amount_total: Some(999),
            currency: Some("usd".to_string()),
            email: Some("jane@example.com".to_string()),
            name: Some("Jane".to_string()),
            hours: Some(5),
        });
        let err = f.service.confirm("cs_cheap").await.unwrap_err();
        assert_eq!(err.kind, licensehub_core::error::ErrorKind::License);
        assert!(f.service.licenses.find_by_order("cs_cheap").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_fail_purchase() {
        let f = fixture();
        let manager = Arc::new(LicenseManager::new(
            Arc::new(MemoryLicenseStore::new()),
            Arc::new(SystemClock),
            f.config.license.clone(),
        ));
        let service = PurchaseService::new(
            &f.config,
            manager,
            Arc::new(f.gateway.clone()),
            Arc::new(FailingMailer),
        );
        let session_id = open_checkout(&f).await;
        f.gateway.mark_paid(&session_id);

        let confirmed = service.confirm(&session_id).await.unwrap();
        assert!(confirmed.newly_issued);
        assert!(!confirmed.email_sent);
    }

    #[tokio::test]
    async fn test_webhook_confirms_purchase_once() {
        let f = fixture();
        let session_id = open_checkout(&f).await;
        f.gateway.mark_paid(&session_id);

        let payload = serde_json::to_vec(&serde_json::json!({
            "type": "checkout.session.completed",
            "data": { "object": { "id": session_id, "payment_status": "paid" } }
        }))
        .unwrap();
        let verifier = WebhookVerifier::new("whsec_test", 300);
        let header = verifier
            .sign(&payload, chrono::Utc::now().timestamp())
            .unwrap();

        let first = f
            .service
            .handle_webhook(&payload, Some(&header))
            .await
            .unwrap();
        assert_eq!(
            first,
            WebhookOutcome::Processed {
                order_id: session_id.clone(),
                newly_issued: true
            }
        );
        let replay = f
            .service
            .handle_webhook(&payload, Some(&header))
            .await
            .unwrap();
        assert_eq!(
            replay,
            WebhookOutcome::Processed {
                order_id: session_id,
                newly_issued: false
            }
        );
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature_and_ignores_other_events() {
        let f = fixture();
        let payload = br#"{"type":"invoice.paid","data":{"object":{}}}"#;
        assert!(f.service.handle_webhook(payload, None).await.is_err());
        assert!(
            f.service
                .handle_webhook(payload, Some("t=1,v1=deadbeef"))
                .await
                .is_err()
        );

        let header = WebhookVerifier::new("whsec_test", 300)
            .sign(payload, chrono::Utc::now().timestamp())
            .unwrap();
        let outcome = f
            .service
            .handle_webhook(payload, Some(&header))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Ignored {
                event_type: "invoice.paid".to_string()
            }
        );
    }
}
