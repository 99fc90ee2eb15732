//! Route definitions for the LicenseHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    let api_routes = Router::new()
        .merge(health_routes())
        .merge(pricing_routes())
        .merge(purchase_routes())
        .merge(webhook_routes())
        .merge(license_routes())
        .merge(admin_routes());

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Liveness and store health
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/detailed", get(handlers::health::detailed_health))
}

/// Price table
fn pricing_routes() -> Router<AppState> {
    Router::new().route("/pricing", get(handlers::pricing::list_prices))
}

/// Checkout start, confirmation, cancellation and trials
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/purchase", post(handlers::purchase::start_purchase))
        .route("/purchase/success", get(handlers::purchase::confirm_purchase))
        .route("/purchase/cancel", post(handlers::purchase::cancel_purchase))
        .route("/trial", post(handlers::trial::start_trial))
}

/// Payment provider callbacks
fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks/payment", post(handlers::webhook::payment_webhook))
}

/// Desktop client endpoints
fn license_routes() -> Router<AppState> {
    Router::new()
        .route("/licenses/activate", post(handlers::license::activate))
        .route("/licenses/usage", post(handlers::license::record_usage))
        .route("/licenses/verify", post(handlers::license::verify_token))
        .route("/licenses/{key}/expiry", get(handlers::license::check_expiry))
}

/// Admin license management
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/licenses",
            get(handlers::admin::list_licenses).post(handlers::admin::grant_license),
        )
        .route("/admin/licenses/stats", get(handlers::admin::license_stats))
        .route("/admin/licenses/{key}", get(handlers::admin::get_license))
        .route(
            "/admin/licenses/{key}/revoke",
            post(handlers::admin::revoke_license),
        )
}
