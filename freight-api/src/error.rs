use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use freight_core::CoreError;
use freight_shipment::ShipmentError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
}

impl From<ShipmentError> for AppError {
    fn from(err: ShipmentError) -> Self {
        AppError::Core(CoreError::Domain(err))
    }
}

impl AppError {
    /// Status and stable kind label for the response body
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Core(CoreError::Domain(err)) => match err {
                ShipmentError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                ShipmentError::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
                ShipmentError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
                ShipmentError::CapacityExceeded { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "capacity_exceeded"),
                ShipmentError::IneligibleProduct { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "ineligible_product"),
                ShipmentError::ModeMismatch { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "mode_mismatch"),
                ShipmentError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            },
            AppError::Core(CoreError::Persistence(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "persistence"),
            AppError::Core(CoreError::Geo(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "geo"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();

        let error_message = if status.is_server_error() {
            tracing::error!("Internal Server Error: {}", self);
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, AppError>;
