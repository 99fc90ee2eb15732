//! Health check handlers.

use axum::Json;
use axum::extract::State;

use licensehub_core::types::ApiResponse;

use crate::dto::response::{DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    }))
}

/// GET /api/health/detailed
pub async fn detailed_health(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let store_healthy = match state.licenses.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            false
        }
    };
    let licenses = if store_healthy {
        state.licenses.stats().await.ok()
    } else {
        None
    };

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: if store_healthy { "ok" } else { "degraded" }.to_string(),
        store: state.licenses.backend().to_string(),
        store_healthy,
        licenses,
    }))
}
