//! Purchase handlers: start, confirm and cancel a checkout.

use axum::Json;
use axum::extract::{Query, State};

use licensehub_core::error::AppError;
use licensehub_service::purchase::PurchaseRequest;

use crate::dto::request::{CancelQuery, ConfirmQuery};
use crate::dto::response::{ConfirmResponse, PurchaseResponse};
use crate::state::AppState;

/// POST /api/purchase
pub async fn start_purchase(
    State(state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = state.purchases.start(&req).await?;
    let body = PurchaseResponse::from_outcome(&outcome, state.licenses.now());
    Ok(Json(serde_json::json!({ "success": true, "data": body })))
}

/// GET /api/purchase/success?session_id=
pub async fn confirm_purchase(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let confirmed = state.purchases.confirm(&query.session_id).await?;
    let body = ConfirmResponse::from_confirmed(&confirmed, state.licenses.now());
    Ok(Json(serde_json::json!({ "success": true, "data": body })))
}

/// POST /api/purchase/cancel
pub async fn cancel_purchase(
    State(state): State<AppState>,
    Query(query): Query<CancelQuery>,
) -> Json<serde_json::Value> {
    state.purchases.cancel(query.session_id.as_deref());
    Json(serde_json::json!({
        "success": true,
        "data": { "message": "Checkout cancelled; no charge was made" }
    }))
}
