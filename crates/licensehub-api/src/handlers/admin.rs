//! Admin license management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use licensehub_core::error::AppError;

use crate::dto::request::GrantRequest;
use crate::dto::response::LicenseResponse;
use crate::dto::validate_request;
use crate::extractors::{AdminAuth, PaginationParams};
use crate::state::AppState;

/// GET /api/admin/licenses
pub async fn list_licenses(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = state.licenses.now();
    let page = state
        .licenses
        .list(params.into_page_request())
        .await?
        .map(|license| LicenseResponse::from_license(&license, now));
    Ok(Json(serde_json::json!({ "success": true, "data": page })))
}

/// POST /api/admin/licenses
pub async fn grant_license(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Json(req): Json<GrantRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    validate_request(&req)?;
    let duration = req.duration()?;
    let license = state.licenses.grant(&req.email, duration).await?;
    let token = state.licenses.token_for(&license)?;
    let body = LicenseResponse::from_license(&license, state.licenses.now()).with_token(token);
    Ok(Json(serde_json::json!({ "success": true, "data": body })))
}

/// GET /api/admin/licenses/stats
pub async fn license_stats(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<serde_json::Value>, AppError> {
    let stats = state.licenses.stats().await?;
    Ok(Json(serde_json::json!({ "success": true, "data": stats })))
}

/// GET /api/admin/licenses/{key}
pub async fn get_license(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let license = state.licenses.get(&key).await?;
    let body = LicenseResponse::from_license(&license, state.licenses.now());
    Ok(Json(serde_json::json!({ "success": true, "data": body })))
}

/// POST /api/admin/licenses/{key}/revoke
pub async fn revoke_license(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let license = state.licenses.revoke(&key).await?;
    let body = LicenseResponse::from_license(&license, state.licenses.now());
    Ok(Json(serde_json::json!({ "success": true, "data": body })))
}
