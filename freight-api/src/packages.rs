use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use freight_core::{Admission, Outcome};
use freight_shipment::{Package, PackageFilter, TrackingView};
use crate::error::{ApiResult, AppError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/packages", get(list_packages))
        .route("/v1/packages/{id}", get(get_package))
        .route("/v1/packages/{id}/cancel", post(cancel_package))
        .route("/v1/packages/{id}/recover", post(recover_package))
        .route("/v1/packages/{id}/lost", post(mark_lost))
        .route("/v1/packages/{id}/archive", post(archive_package))
        .route("/v1/track/{code}", get(track))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub recipient_code: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/packages
pub async fn list_packages(
    State(state): State<AppState>,
    Query(filter): Query<PackageFilter>,
) -> ApiResult<Json<Vec<Package>>> {
    Ok(Json(state.service.search_packages(&filter).await?))
}

/// GET /v1/packages/:id
pub async fn get_package(
    State(state): State<AppState>,
    Path(package_id): Path<Uuid>,
) -> ApiResult<Json<Package>> {
    Ok(Json(state.service.get_package(package_id).await?))
}

/// POST /v1/packages/:id/cancel
/// Withdraw a pending package from its open shipment
pub async fn cancel_package(
    State(state): State<AppState>,
    Path(package_id): Path<Uuid>,
) -> ApiResult<Json<Admission>> {
    Ok(Json(state.service.cancel_package(package_id).await?))
}

/// POST /v1/packages/:id/recover
/// Hand-over to the recipient against the recipient code
pub async fn recover_package(
    State(state): State<AppState>,
    Path(package_id): Path<Uuid>,
    Json(req): Json<RecoverRequest>,
) -> ApiResult<Json<Package>> {
    if req.recipient_code.trim().is_empty() {
        return Err(AppError::BadRequest("recipient_code is required".to_string()));
    }
    Ok(Json(state.service.mark_recovered(package_id, &req.recipient_code).await?))
}

/// POST /v1/packages/:id/lost
pub async fn mark_lost(
    State(state): State<AppState>,
    Path(package_id): Path<Uuid>,
) -> ApiResult<Json<Outcome<Package>>> {
    Ok(Json(state.service.mark_lost(package_id).await?))
}

/// POST /v1/packages/:id/archive
pub async fn archive_package(
    State(state): State<AppState>,
    Path(package_id): Path<Uuid>,
) -> ApiResult<Json<Package>> {
    Ok(Json(state.service.archive_package(package_id).await?))
}

/// GET /v1/track/:code
/// Public tracking by recipient code
pub async fn track(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<TrackingView>> {
    Ok(Json(state.service.track(&code).await?))
}
