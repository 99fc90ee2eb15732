//! # licensehub-service
//!
//! Business logic for LicenseHub. The [`LicenseManager`] owns the license
//! lifecycle; the [`PurchaseService`] turns confirmed payments into
//! licenses and mails them out.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod email;
pub mod license;
pub mod mail;
pub mod payment;
pub mod purchase;
pub mod secret;

pub use license::{LicenseError, LicenseManager, UsageOutcome};
pub use purchase::{PurchaseOutcome, PurchaseService};
