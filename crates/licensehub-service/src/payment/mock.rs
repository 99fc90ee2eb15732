//! In-process payment gateway for development and tests.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use licensehub_core::error::AppError;
use licensehub_core::result::AppResult;

use super::gateway::{CheckoutRequest, CheckoutSession, PaymentGateway, PaymentStatus};

/// Gateway that keeps sessions in memory.
///
/// With `auto_pay` every new session is immediately paid, which makes the
/// development flow work end to end without a provider account.
#[derive(Debug, Clone)]
pub struct MockGateway {
    sessions: Arc<DashMap<String, CheckoutSession>>,
    auto_pay: bool,
}

impl MockGateway {
    /// Creates a new mock gateway.
    pub fn new(auto_pay: bool) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            auto_pay,
        }
    }

    /// Mark a session paid. Returns `false` for unknown sessions.
    pub fn mark_paid(&self, session_id: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut session) => {
                session.payment_status = PaymentStatus::Paid;
                session.url = None;
                true
            }
            None => false,
        }
    }

    /// Insert or replace a session as-is.
    pub fn insert(&self, session: CheckoutSession) {
        self.sessions.insert(session.id.clone(), session);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> AppResult<CheckoutSession> {
        let id = format!("cs_mock_{}", Uuid::new_v4().simple());
        let status = if self.auto_pay {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        };
        let session = CheckoutSession {
            url: Some(request.success_url.replace("{CHECKOUT_SESSION_ID}", &id)),
            id: id.clone(),
            payment_status: status,
            amount_total: Some(request.quote.amount_cents),
            currency: Some(request.quote.currency.clone()),
            email: Some(request.email.clone()),
            name: Some(request.name.clone()),
            hours: Some(request.quote.hours),
        };
        self.sessions.insert(id.clone(), session.clone());
        info!(session_id = %id, "Mock checkout session created");
        Ok(session)
    }

    async fn retrieve(&self, session_id: &str) -> AppResult<CheckoutSession> {
        self.sessions
            .get(session_id)
            .map(|s| s.value().clone())
            .ok_or_else(|| AppError::not_found("Checkout session not found"))
    }

    fn provider(&self) -> &'static str {
        "mock"
    }
}
