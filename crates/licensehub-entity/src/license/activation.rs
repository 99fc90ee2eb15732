//! Activation result value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kind::LicenseKind;
use super::model::License;
use super::status::LicenseStatus;

/// What the desktop application learns when it activates a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationResult {
    /// The activated key.
    pub key: String,
    /// Status as observed at activation time.
    pub status: LicenseStatus,
    /// License kind.
    pub kind: LicenseKind,
    /// Seconds left.
    pub remaining_seconds: i64,
    /// Calendar end: wall-clock window or validity cap, whichever is first.
    pub expires_at: Option<DateTime<Utc>>,
    /// Signed license token for offline checks, when signing is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ActivationResult {
    /// Snapshot a license at `now`.
    pub fn observe(license: &License, now: DateTime<Utc>) -> Self {
        Self {
            key: license.key.clone(),
            status: license.effective_status(now),
            kind: license.kind,
            remaining_seconds: license.remaining_seconds(now),
            expires_at: license.expires_at(),
            token: None,
        }
    }
}
