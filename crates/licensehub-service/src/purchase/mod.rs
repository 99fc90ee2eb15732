//! Purchase flow: pricing, checkout, confirmation and webhooks.

pub mod pricing;
pub mod service;

pub use pricing::PriceList;
pub use service::{
    CheckoutUrls, ConfirmedPurchase, PurchaseOutcome, PurchaseRequest, PurchaseService,
    WebhookOutcome,
};
