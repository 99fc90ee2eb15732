//! Trial handler.

use axum::Json;
use axum::extract::State;

use licensehub_core::error::AppError;

use crate::dto::request::TrialRequest;
use crate::dto::response::LicenseResponse;
use crate::dto::validate_request;
use crate::state::AppState;

/// POST /api/trial
pub async fn start_trial(
    State(state): State<AppState>,
    Json(req): Json<TrialRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    validate_request(&req)?;
    let license = state.licenses.start_trial(&req.email).await?;
    let token = state.licenses.token_for(&license)?;
    let body = LicenseResponse::from_license(&license, state.licenses.now()).with_token(token);
    Ok(Json(serde_json::json!({ "success": true, "data": body })))
}
