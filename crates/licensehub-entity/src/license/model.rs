//! License entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::kind::LicenseKind;
use super::status::LicenseStatus;

/// A license key and its accounting state.
///
/// Time values are whole seconds. For [`LicenseKind::Purchase`] the
/// allotment is a usage quota drawn down by `consumed_seconds`; for the
/// wall-clock kinds it is a window that starts at `issued_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct License {
    /// Opaque, unguessable license key.
    #[sqlx(rename = "license_key")]
    pub key: String,
    /// Owner e-mail (lower-cased).
    pub email: String,
    /// External payment reference, or a synthetic id for trials and grants.
    pub order_id: String,
    /// How the license was created.
    pub kind: LicenseKind,
    /// Usage quota or wall-clock window, in seconds.
    pub allotted_seconds: i64,
    /// Usage consumed so far, in seconds. Always `<= allotted_seconds`.
    pub consumed_seconds: i64,
    /// Lifecycle status.
    pub status: LicenseStatus,
    /// When the license was issued.
    pub issued_at: DateTime<Utc>,
    /// When the license was last modified.
    pub updated_at: DateTime<Utc>,
    /// Row version for compare-and-swap.
    pub version: i64,
}

/// Every license stops being valid this many days after issue, whatever
/// its kind or remaining allotment.
pub const MAX_VALIDITY_DAYS: i64 = 365;

/// Largest allotment a license can carry, in seconds.
pub const MAX_ALLOTTED_SECONDS: i64 = MAX_VALIDITY_DAYS * 86_400;

impl License {
    /// Build a fresh active license.
    pub fn new(
        key: String,
        email: String,
        order_id: String,
        kind: LicenseKind,
        allotted_seconds: i64,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            email,
            order_id,
            kind,
            allotted_seconds,
            consumed_seconds: 0,
            status: LicenseStatus::Active,
            issued_at,
            updated_at: issued_at,
            version: 0,
        }
    }

    /// Hard end of validity, one year after issue.
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.issued_at
            .checked_add_signed(Duration::days(MAX_VALIDITY_DAYS))
    }

    /// End of the wall-clock window. `None` for usage-metered licenses and
    /// for windows that do not fit the calendar.
    pub fn window_end(&self) -> Option<DateTime<Utc>> {
        if !self.kind.is_wall_clock() {
            return None;
        }
        Duration::try_seconds(self.allotted_seconds)
            .and_then(|window| self.issued_at.checked_add_signed(window))
    }

    /// The earliest point at which the license stops being usable on the
    /// calendar: the wall-clock window or the validity cap.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match (self.window_end(), self.valid_until()) {
            (Some(window), Some(cap)) => Some(window.min(cap)),
            (window, cap) => window.or(cap),
        }
    }

    /// Whether the calendar end has been reached at `now`. An end that
    /// cannot be represented never arrives.
    pub fn has_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|end| now >= end)
    }

    /// Seconds left at `now`, never negative.
    ///
    /// Revoked and expired licenses have nothing left, and neither has a
    /// license past its calendar end.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        if !self.status.is_active() || self.has_lapsed(now) {
            return 0;
        }
        if self.kind.is_wall_clock() {
            match self.expires_at() {
                Some(end) => (end - now).num_seconds().clamp(0, self.allotted_seconds),
                None => self.allotted_seconds.max(0),
            }
        } else {
            (self.allotted_seconds - self.consumed_seconds).max(0)
        }
    }

    /// Status as observed at `now`.
    ///
    /// An active license past its calendar end reports `Expired` even
    /// before the change is persisted.
    pub fn effective_status(&self, now: DateTime<Utc>) -> LicenseStatus {
        if self.status.is_active() && self.has_lapsed(now) {
            LicenseStatus::Expired
        } else {
            self.status
        }
    }

    /// Whether the license should be considered expired at `now`.
    ///
    /// Wall-clock licenses compare elapsed time with the window regardless
    /// of status; usage-metered licenses report their persisted status.
    /// Both honour the one-year validity cap.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.kind.is_wall_clock() {
            self.has_lapsed(now)
        } else {
            self.status == LicenseStatus::Expired
                || self.valid_until().is_some_and(|cap| now >= cap)
        }
    }

    /// Apply a usage report of `elapsed` seconds.
    ///
    /// Returns `false` when the report does not apply (wall-clock kind or
    /// inactive license). Overflow clamps to the allotment and expires the
    /// license.
    pub fn apply_usage(&mut self, elapsed: i64, now: DateTime<Utc>) -> bool {
        if self.kind.is_wall_clock()
            || !self.status.is_active()
            || elapsed <= 0
            || self.has_lapsed(now)
        {
            return false;
        }
        self.consumed_seconds = self
            .consumed_seconds
            .saturating_add(elapsed)
            .min(self.allotted_seconds);
        if self.consumed_seconds >= self.allotted_seconds {
            self.status = LicenseStatus::Expired;
        }
        self.updated_at = now;
        true
    }

    /// Move to `next` if the transition is legal. Returns whether anything
    /// changed.
    pub fn transition(&mut self, next: LicenseStatus, now: DateTime<Utc>) -> bool {
        if self.status == next || !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = now;
        true
    }
}
