//! Payment gateway trait and checkout types.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use licensehub_core::result::AppResult;
use licensehub_entity::order::Quote;

/// Payment state of a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Funds captured.
    Paid,
    /// Not paid (yet).
    Unpaid,
    /// Session completed without a charge.
    NoPaymentRequired,
}

impl PaymentStatus {
    /// Parse the provider's status string. Unknown values count as unpaid.
    pub fn parse(value: &str) -> Self {
        match value {
            "paid" => Self::Paid,
            "no_payment_required" => Self::NoPaymentRequired,
            _ => Self::Unpaid,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
            Self::NoPaymentRequired => "no_payment_required",
        };
        write!(f, "{s}")
    }
}

/// Everything the gateway needs to open a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Buyer's name.
    pub name: String,
    /// Buyer's e-mail (normalized).
    pub email: String,
    /// Server-side price for the requested hours.
    pub quote: Quote,
    /// Line item name.
    pub product_name: String,
    /// Redirect after payment. Contains `{CHECKOUT_SESSION_ID}`.
    pub success_url: String,
    /// Redirect when the buyer backs out.
    pub cancel_url: String,
}

/// A checkout session as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider session id. Used as the license order id.
    pub id: String,
    /// Hosted checkout page, when the session is still open.
    pub url: Option<String>,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Amount charged in the smallest currency unit.
    pub amount_total: Option<i64>,
    /// Currency code.
    pub currency: Option<String>,
    /// Buyer e-mail recorded on the session.
    pub email: Option<String>,
    /// Buyer name recorded on the session.
    pub name: Option<String>,
    /// Purchased hours recorded on the session.
    pub hours: Option<u32>,
}

/// Payment provider collaborator.
#[async_trait]
pub trait PaymentGateway: Send + Sync + fmt::Debug {
    /// Open a hosted checkout session.
    async fn create_checkout(&self, request: &CheckoutRequest) -> AppResult<CheckoutSession>;

    /// Fetch the current state of a session.
    async fn retrieve(&self, session_id: &str) -> AppResult<CheckoutSession>;

    /// Short provider name for logs and health output.
    fn provider(&self) -> &'static str;
}
