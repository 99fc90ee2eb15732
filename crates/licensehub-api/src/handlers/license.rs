//! Desktop client handlers: activation, usage heartbeat, expiry check.

use axum::Json;
use axum::extract::{Path, State};

use licensehub_core::error::AppError;

use crate::dto::request::{ActivateRequest, UsageRequest, VerifyTokenRequest};
use crate::dto::response::{ExpiryResponse, TokenCheckResponse};
use crate::dto::validate_request;
use crate::state::AppState;

/// POST /api/licenses/activate
pub async fn activate(
    State(state): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    validate_request(&req)?;
    let result = state.licenses.activate(req.key.trim()).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": result })))
}

/// POST /api/licenses/usage
///
/// Answers 200 for unknown keys and dropped reports; the outcome field
/// says what happened.
pub async fn record_usage(
    State(state): State<AppState>,
    Json(req): Json<UsageRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    validate_request(&req)?;
    let outcome = state
        .licenses
        .record_usage(req.key.trim(), req.elapsed()?)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": outcome })))
}

/// GET /api/licenses/{key}/expiry
pub async fn check_expiry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let expired = state.licenses.check_expiry(key.trim()).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": ExpiryResponse { expired }
    })))
}

/// POST /api/licenses/verify
///
/// Checks a signed license token and reports the license as it stands now.
pub async fn verify_token(
    State(state): State<AppState>,
    Json(req): Json<VerifyTokenRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    validate_request(&req)?;
    let (claims, license) = state.licenses.verify_token(&req.token).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": TokenCheckResponse { claims, license }
    })))
}
