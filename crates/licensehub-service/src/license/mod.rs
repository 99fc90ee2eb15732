//! License lifecycle: issuing, activation, usage accounting, expiry and
//! revocation.

pub mod error;
pub mod key;
pub mod manager;
pub mod token;

pub use error::LicenseError;
pub use manager::{LicenseManager, UsageOutcome};
pub use token::{LicenseClaims, LicenseTokenSigner};
