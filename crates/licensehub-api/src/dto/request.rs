//! Request DTOs with validation.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::Validate;

use licensehub_core::error::AppError;
use licensehub_entity::order::quote::SECONDS_PER_HOUR;

/// License activation request from the desktop client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ActivateRequest {
    /// License key.
    #[validate(length(min = 1, max = 128, message = "License key is required"))]
    pub key: String,
}

/// Usage heartbeat from the desktop client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UsageRequest {
    /// License key.
    #[validate(length(min = 1, max = 128, message = "License key is required"))]
    pub key: String,
    /// Seconds of use since the previous report. At most one year.
    #[validate(range(
        min = 0,
        max = 31_536_000,
        message = "elapsed_seconds must be between 0 and 31536000"
    ))]
    pub elapsed_seconds: i64,
}

impl UsageRequest {
    /// The reported interval.
    pub fn elapsed(&self) -> Result<Duration, AppError> {
        Duration::try_seconds(self.elapsed_seconds)
            .ok_or_else(|| AppError::validation("elapsed_seconds is out of range"))
    }
}

/// Trial request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrialRequest {
    /// Requester's e-mail.
    #[validate(length(min = 1, max = 254, message = "Email is required"))]
    pub email: String,
}

/// Admin grant request. Exactly one of `hours` or `duration_seconds`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GrantRequest {
    /// Recipient e-mail.
    #[validate(length(min = 1, max = 254, message = "Email is required"))]
    pub email: String,
    /// Whole hours.
    #[validate(range(min = 1, max = 8760))]
    pub hours: Option<u32>,
    /// Exact seconds. At most one year.
    #[validate(range(min = 1, max = 31_536_000))]
    pub duration_seconds: Option<i64>,
}

impl GrantRequest {
    /// The requested window.
    pub fn duration(&self) -> Result<Duration, AppError> {
        match (self.hours, self.duration_seconds) {
            (Some(hours), None) => Ok(Duration::seconds(i64::from(hours) * SECONDS_PER_HOUR)),
            (None, Some(seconds)) => Duration::try_seconds(seconds)
                .ok_or_else(|| AppError::validation("duration_seconds is out of range")),
            (Some(_), Some(_)) => Err(AppError::validation(
                "Specify either hours or duration_seconds, not both",
            )),
            (None, None) => Err(AppError::validation(
                "Either hours or duration_seconds is required",
            )),
        }
    }
}

/// Signed license token check.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyTokenRequest {
    /// Token as returned on activation.
    #[validate(length(min = 1, max = 4096, message = "Token is required"))]
    pub token: String,
}

/// Query string on the checkout success redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmQuery {
    /// Payment provider session id.
    pub session_id: String,
}

/// Query string on the checkout cancel redirect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelQuery {
    /// Payment provider session id, when the provider sends one.
    pub session_id: Option<String>,
}
