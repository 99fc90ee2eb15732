//! Request and response data transfer objects.

pub mod request;
pub mod response;

use validator::Validate;

use licensehub_core::error::AppError;

/// Runs `validator` rules on a request body.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}
