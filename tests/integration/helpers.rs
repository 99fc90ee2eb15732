//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use licensehub_api::AppState;
use licensehub_core::config::AppConfig;
use licensehub_core::traits::{Clock, ManualClock};
use licensehub_database::store::MemoryLicenseStore;
use licensehub_service::mail::LogMailer;
use licensehub_service::payment::{MockGateway, WebhookVerifier};
use licensehub_service::license::LicenseTokenSigner;
use licensehub_service::{LicenseManager, PurchaseService};

/// Bearer token accepted by the admin endpoints.
pub const ADMIN_TOKEN: &str = "test-admin-token";
/// Address on the admin allowlist.
pub const ADMIN_EMAIL: &str = "owner@licensehub.dev";
/// Webhook signing secret.
pub const WEBHOOK_SECRET: &str = "whsec_integration";
/// License token signing secret.
pub const TOKEN_SECRET: &str = "token-integration-secret";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Controls "now" for every component
    pub clock: Arc<ManualClock>,
    /// Payment gateway; sessions start unpaid
    pub gateway: Arc<MockGateway>,
    /// Outbox of license e-mails
    pub mailer: Arc<LogMailer>,
    /// Direct access to the license manager
    pub licenses: Arc<LicenseManager>,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        Self::with_config(Self::config())
    }

    /// Configuration used by [`TestApp::new`].
    pub fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.admin.api_token = ADMIN_TOKEN.to_string();
        config.admin.emails = vec![ADMIN_EMAIL.to_string()];
        config.payment.webhook_secret = WEBHOOK_SECRET.to_string();
        config.token.secret = TOKEN_SECRET.to_string();
        config
    }

    /// Create a test application from an explicit configuration
    pub fn with_config(config: AppConfig) -> Self {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let gateway = Arc::new(MockGateway::new(false));
        let mailer = Arc::new(LogMailer::new());

        let tokens =
            LicenseTokenSigner::from_config(&config.token).expect("Failed to build token signer");
        let licenses = Arc::new(
            LicenseManager::new(
                Arc::new(MemoryLicenseStore::new()),
                clock.clone(),
                config.license.clone(),
            )
            .with_tokens(tokens),
        );
        let purchases = Arc::new(PurchaseService::new(
            &config,
            Arc::clone(&licenses),
            gateway.clone(),
            mailer.clone(),
        ));

        let state = AppState::new(Arc::new(config), Arc::clone(&licenses), purchases);
        let router = licensehub_api::build_app(state);

        Self {
            router,
            clock,
            gateway,
            mailer,
            licenses,
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, seconds: i64) {
        self.clock.advance(Duration::seconds(seconds));
    }

    /// Issue a usage-metered license directly and return its key.
    pub async fn issue_purchase(&self, email: &str, seconds: i64, order_id: &str) -> String {
        self.licenses
            .issue(email, Duration::seconds(seconds), order_id)
            .await
            .expect("Failed to issue license")
            .key
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// POST a webhook delivery with an optional `Stripe-Signature` header.
    pub async fn post_webhook(&self, payload: &Value, signature: Option<String>) -> TestResponse {
        let mut req = Request::builder()
            .method("POST")
            .uri("/api/webhooks/payment")
            .header("Content-Type", "application/json");

        if let Some(signature) = signature {
            req = req.header("Stripe-Signature", signature);
        }

        let req = req
            .body(Body::from(payload.to_string()))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Signature header for `payload` at the current clock time.
    pub fn sign(&self, payload: &Value) -> String {
        WebhookVerifier::new(WEBHOOK_SECRET, 300)
            .sign(payload.to_string().as_bytes(), self.clock.now().timestamp())
            .expect("Failed to sign payload")
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` field of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `error` code of an error body.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
