use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use freight_shipment::{Client, ShipmentStatistics};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/stats", get(statistics))
        .route("/v1/clients", get(list_clients))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "price_floor": state.service.pricing().price_floor(),
        "archive_after_days": state.business_rules.archive_after_days,
    }))
}

/// GET /v1/stats
pub async fn statistics(State(state): State<AppState>) -> ApiResult<Json<ShipmentStatistics>> {
    Ok(Json(state.service.statistics().await?))
}

/// GET /v1/clients
pub async fn list_clients(State(state): State<AppState>) -> ApiResult<Json<Vec<Client>>> {
    Ok(Json(state.service.list_clients().await?))
}
