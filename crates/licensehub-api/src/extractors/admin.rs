//! `AdminAuth` extractor: checks the admin bearer token.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use licensehub_core::error::AppError;
use licensehub_service::secret::secrets_match;

use crate::state::AppState;

/// Proof that the request carried the configured admin API token.
///
/// An empty `admin.api_token` disables every admin endpoint.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.config.admin.api_token.as_str();
        if expected.is_empty() {
            return Err(AppError::authorization("Admin API is disabled"));
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;

        if !secrets_match(expected.as_bytes(), token.trim().as_bytes()) {
            tracing::warn!("Rejected admin request with a wrong token");
            return Err(AppError::authentication("Invalid admin token"));
        }

        Ok(AdminAuth)
    }
}
