//! License kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a license was created, which also decides how its time is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "license_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LicenseKind {
    /// Paid license. Time is consumed by reported usage.
    Purchase,
    /// Free trial. Time runs on the wall clock from issue.
    Trial,
    /// Issued by an administrator. Time runs on the wall clock from issue.
    AdminGrant,
}

impl LicenseKind {
    /// Whether remaining time is measured against the wall clock rather
    /// than accumulated usage.
    pub fn is_wall_clock(&self) -> bool {
        matches!(self, Self::Trial | Self::AdminGrant)
    }

    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Trial => "trial",
            Self::AdminGrant => "admin_grant",
        }
    }
}

impl fmt::Display for LicenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LicenseKind {
    type Err = licensehub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "purchase" => Ok(Self::Purchase),
            "trial" => Ok(Self::Trial),
            "admin_grant" | "admin" => Ok(Self::AdminGrant),
            _ => Err(licensehub_core::AppError::validation(format!(
                "Invalid license kind: '{s}'. Expected one of: purchase, trial, admin_grant"
            ))),
        }
    }
}
