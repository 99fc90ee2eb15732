//! Price table handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{PriceResponse, PricingResponse};
use crate::state::AppState;

/// GET /api/pricing
pub async fn list_prices(State(state): State<AppState>) -> Json<serde_json::Value> {
    let prices = state.purchases.prices();
    let body = PricingResponse {
        product_name: prices.product_name().to_string(),
        prices: prices.quotes().iter().map(PriceResponse::from).collect(),
    };
    Json(serde_json::json!({ "success": true, "data": body }))
}
