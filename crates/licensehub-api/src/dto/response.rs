//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use licensehub_database::LicenseStats;
use licensehub_entity::license::{License, LicenseKind, LicenseStatus};
use licensehub_entity::order::Quote;
use licensehub_entity::license::ActivationResult;
use licensehub_service::PurchaseOutcome;
use licensehub_service::license::LicenseClaims;
use licensehub_service::purchase::ConfirmedPurchase;

/// A license as shown to buyers and administrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseResponse {
    /// License key.
    pub key: String,
    /// Holder e-mail.
    pub email: String,
    /// Order the license was issued for.
    pub order_id: String,
    /// Purchase, trial or admin grant.
    pub kind: LicenseKind,
    /// Status as of the response time.
    pub status: LicenseStatus,
    /// Total seconds granted.
    pub allotted_seconds: i64,
    /// Seconds used (usage-metered licenses).
    pub consumed_seconds: i64,
    /// Seconds left.
    pub remaining_seconds: i64,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// Calendar end: wall-clock window or the one-year validity cap.
    pub expires_at: Option<DateTime<Utc>>,
    /// Signed license token, when signing is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl LicenseResponse {
    /// Builds the view of `license` at `now`.
    pub fn from_license(license: &License, now: DateTime<Utc>) -> Self {
        Self {
            key: license.key.clone(),
            email: license.email.clone(),
            order_id: license.order_id.clone(),
            kind: license.kind,
            status: license.effective_status(now),
            allotted_seconds: license.allotted_seconds,
            consumed_seconds: license.consumed_seconds,
            remaining_seconds: license.remaining_seconds(now),
            issued_at: license.issued_at,
            expires_at: license.expires_at(),
            token: None,
        }
    }

    /// Attach a signed token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// One entry of the price table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    /// Usage hours.
    pub hours: u32,
    /// Price in the smallest currency unit.
    pub amount_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// Formatted price, e.g. `$9.99`.
    pub display: String,
}

impl From<&Quote> for PriceResponse {
    fn from(quote: &Quote) -> Self {
        Self {
            hours: quote.hours,
            amount_cents: quote.amount_cents,
            currency: quote.currency.clone(),
            display: quote.display_amount(),
        }
    }
}

/// Price table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingResponse {
    /// Product name shown at checkout.
    pub product_name: String,
    /// Packages, shortest first.
    pub prices: Vec<PriceResponse>,
}

/// Result of starting a purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PurchaseResponse {
    /// Admin e-mail: the license exists already.
    Granted {
        /// The granted license.
        license: LicenseResponse,
        /// Whether the license e-mail went out.
        email_sent: bool,
    },
    /// Regular buyer: continue at the payment provider.
    Checkout {
        /// Provider session id.
        session_id: String,
        /// Where to send the buyer.
        checkout_url: String,
        /// Chosen package.
        price: PriceResponse,
    },
}

impl PurchaseResponse {
    /// Builds the response for a purchase outcome.
    pub fn from_outcome(outcome: &PurchaseOutcome, now: DateTime<Utc>) -> Self {
        match outcome {
            PurchaseOutcome::Granted {
                license,
                email_sent,
            } => Self::Granted {
                license: LicenseResponse::from_license(license, now),
                email_sent: *email_sent,
            },
            PurchaseOutcome::Checkout {
                session_id,
                checkout_url,
                quote,
            } => Self::Checkout {
                session_id: session_id.clone(),
                checkout_url: checkout_url.clone(),
                price: PriceResponse::from(quote),
            },
        }
    }
}

/// Result of confirming a checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmResponse {
    /// The order's license.
    pub license: LicenseResponse,
    /// False when the order had already been confirmed.
    pub newly_issued: bool,
    /// Whether the license e-mail went out on this call.
    pub email_sent: bool,
}

impl ConfirmResponse {
    /// Builds the response for a confirmed purchase.
    pub fn from_confirmed(confirmed: &ConfirmedPurchase, now: DateTime<Utc>) -> Self {
        Self {
            license: LicenseResponse::from_license(&confirmed.license, now),
            newly_issued: confirmed.newly_issued,
            email_sent: confirmed.email_sent,
        }
    }
}

/// Expiry check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryResponse {
    /// Whether the license has expired.
    pub expired: bool,
}

/// Basic health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` when the process answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since start.
    pub uptime_seconds: u64,
}

/// Detailed health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Store backend name.
    pub store: String,
    /// Whether the store answered.
    pub store_healthy: bool,
    /// License counts, when the store answered.
    pub licenses: Option<LicenseStats>,
}

/// Result of a token check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCheckResponse {
    /// Verified token claims.
    pub claims: LicenseClaims,
    /// The license as it stands now.
    pub license: ActivationResult,
}
