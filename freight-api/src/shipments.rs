use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use freight_catalog::{PriceQuote, Product};
use freight_core::{Admission, CreateShipmentRequest, Manifest, Outcome, ShipmentUpdate};
use freight_shipment::{AdmissionRequest, Shipment, ShipmentFilter};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/shipments", post(create_shipment).get(list_shipments))
        .route("/v1/shipments/{id}", get(get_shipment))
        .route("/v1/shipments/{id}/close", post(close_shipment))
        .route("/v1/shipments/{id}/reopen", post(reopen_shipment))
        .route("/v1/shipments/{id}/start", post(start_shipment))
        .route("/v1/shipments/{id}/arrive", post(arrive_shipment))
        .route("/v1/shipments/{id}/packages", post(add_package))
        .route("/v1/shipments/{id}/quote", post(quote_package))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub product: Product,
    #[serde(default = "one")]
    pub unit_count: u32,
}

fn one() -> u32 {
    1
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/shipments
pub async fn create_shipment(
    State(state): State<AppState>,
    Json(req): Json<CreateShipmentRequest>,
) -> ApiResult<(StatusCode, Json<Shipment>)> {
    let shipment = state.service.create_shipment(req).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// GET /v1/shipments
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(filter): Query<ShipmentFilter>,
) -> ApiResult<Json<Vec<Shipment>>> {
    Ok(Json(state.service.search_shipments(&filter).await?))
}

/// GET /v1/shipments/:id
/// Shipment with its manifest
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> ApiResult<Json<Manifest>> {
    Ok(Json(state.service.manifest(shipment_id).await?))
}

/// POST /v1/shipments/:id/close
pub async fn close_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> ApiResult<Json<Shipment>> {
    Ok(Json(state.service.close(shipment_id).await?))
}

/// POST /v1/shipments/:id/reopen
pub async fn reopen_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> ApiResult<Json<Shipment>> {
    Ok(Json(state.service.reopen(shipment_id).await?))
}

/// POST /v1/shipments/:id/start
pub async fn start_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> ApiResult<Json<Outcome<ShipmentUpdate>>> {
    Ok(Json(state.service.start(shipment_id).await?))
}

/// POST /v1/shipments/:id/arrive
pub async fn arrive_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> ApiResult<Json<Outcome<ShipmentUpdate>>> {
    Ok(Json(state.service.mark_arrived(shipment_id).await?))
}

/// POST /v1/shipments/:id/packages
pub async fn add_package(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
    Json(req): Json<AdmissionRequest>,
) -> ApiResult<(StatusCode, Json<Outcome<Admission>>)> {
    let outcome = state.service.add_package(shipment_id, req).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /v1/shipments/:id/quote
/// Price a package without admitting it
pub async fn quote_package(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
    Json(req): Json<QuoteRequest>,
) -> ApiResult<Json<PriceQuote>> {
    Ok(Json(state.service.quote(shipment_id, &req.product, req.unit_count).await?))
}
