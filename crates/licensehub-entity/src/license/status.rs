//! License status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a license.
///
/// `Active` may move to `Expired` or `Revoked`; `Expired` may move to
/// `Revoked`. Nothing ever returns to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "license_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// The license can be used.
    Active,
    /// The allotted time has been used up or has elapsed.
    Expired,
    /// An administrator revoked the license.
    Revoked,
}

impl LicenseStatus {
    /// Whether the license may still be used.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(&self, next: LicenseStatus) -> bool {
        match (self, next) {
            (a, b) if *a == b => true,
            (Self::Active, _) => true,
            (Self::Expired, Self::Revoked) => true,
            _ => false,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LicenseStatus {
    type Err = licensehub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "revoked" => Ok(Self::Revoked),
            _ => Err(licensehub_core::AppError::validation(format!(
                "Invalid license status: '{s}'. Expected one of: active, expired, revoked"
            ))),
        }
    }
}
