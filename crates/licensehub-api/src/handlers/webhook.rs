//! Payment provider webhook handler.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;

use licensehub_core::error::AppError;

use crate::state::AppState;

/// Header carrying the `t=..,v1=..` signature.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// POST /api/webhooks/payment
///
/// The raw body is needed for signature verification, so it is taken as
/// bytes rather than JSON.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state.purchases.handle_webhook(&body, signature).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": outcome })))
}
