pub mod repository;
pub mod notifier;
pub mod geo;
pub mod locks;
pub mod service;

pub use repository::{InMemoryRepository, RecordBatch, RepoError, RepoResult, ShipmentRepository};
pub use notifier::{NotificationWarning, Notifier, NotifyOutcome};
pub use geo::{haversine_km, Coordinates, GeoResolver};
pub use service::{
    Admission, CreateShipmentRequest, Manifest, Outcome, PlaceInput, ShipmentService, ShipmentUpdate,
};

use freight_shipment::ShipmentError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Domain(#[from] ShipmentError),
    #[error("Persistence failure: {0}")]
    Persistence(String),
    #[error("Location lookup failed: {0}")]
    Geo(String),
}

impl CoreError {
    pub fn persistence(err: RepoError) -> Self {
        CoreError::Persistence(err.to_string())
    }

    /// The domain error, if this is one
    pub fn domain(&self) -> Option<&ShipmentError> {
        match self {
            CoreError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
