//! License lifecycle errors.

use thiserror::Error;

use licensehub_core::error::{AppError, ErrorKind};

/// Errors returned by [`LicenseManager`](super::LicenseManager).
#[derive(Debug, Error)]
pub enum LicenseError {
    /// A license was already issued for this order.
    #[error("Order '{order_id}' already has a license")]
    DuplicateOrder {
        /// The order id that was reused.
        order_id: String,
    },

    /// Duration or elapsed time was not acceptable.
    #[error("Duration must be positive and at most 365 days")]
    InvalidDuration,

    /// No license exists for the key.
    #[error("License key not found")]
    UnknownKey,

    /// The e-mail address failed validation.
    #[error("{0}")]
    InvalidEmail(String),

    /// The order id was empty.
    #[error("Order id must not be empty")]
    InvalidOrderId,

    /// A license token failed signature or format checks.
    #[error("Invalid license token")]
    InvalidToken,

    /// A license token is past its `exp`.
    #[error("License token has expired")]
    TokenExpired,

    /// Concurrent writers kept winning the compare-and-swap.
    #[error("License is being modified concurrently; gave up after {attempts} attempts")]
    Contention {
        /// Attempts made.
        attempts: u32,
    },

    /// Store or other infrastructure failure.
    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<LicenseError> for AppError {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::Store(inner) => inner,
            LicenseError::UnknownKey => AppError::not_found(err.to_string()),
            LicenseError::DuplicateOrder { .. } | LicenseError::Contention { .. } => {
                AppError::new(ErrorKind::Conflict, err.to_string())
            }
            LicenseError::InvalidToken => AppError::authentication(err.to_string()),
            LicenseError::TokenExpired => AppError::license(err.to_string()),
            LicenseError::InvalidDuration
            | LicenseError::InvalidEmail(_)
            | LicenseError::InvalidOrderId => AppError::validation(err.to_string()),
        }
    }
}
