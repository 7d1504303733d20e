pub mod models;
pub mod lifecycle;
pub mod transitions;
pub mod admission;
pub mod codes;
pub mod archive;
pub mod search;
pub mod statistics;

pub use models::{
    Client, Contact, LifecycleState, Package, PackageState, Place, ProgressState, Route, Shipment,
};
pub use admission::AdmissionRequest;
pub use lifecycle::ShipmentDraft;
pub use archive::ArchivePolicy;
pub use search::{PackageFilter, ShipmentFilter, TrackingView};
pub use statistics::{ShipmentStatistics, ShipmentUtilization};

use freight_catalog::{CatalogError, ProductKind, TransportMode};

/// Domain errors raised by the shipment and package rules
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShipmentError {
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid package transition from {from} to {to}")]
    InvalidTransition {
        from: PackageState,
        to: PackageState,
    },

    #[error("Capacity exceeded: requested {requested} kg, available {available} kg")]
    CapacityExceeded {
        requested: f64,
        available: f64,
    },

    #[error("Product {product} is not eligible for {mode} transport")]
    IneligibleProduct {
        product: ProductKind,
        mode: TransportMode,
    },

    #[error("Transport mode mismatch: shipment travels by {shipment_mode}, package requested {requested}")]
    ModeMismatch {
        shipment_mode: TransportMode,
        requested: TransportMode,
    },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl ShipmentError {
    pub fn shipment_not_found(id: uuid::Uuid) -> Self {
        ShipmentError::NotFound {
            entity: "Shipment",
            id: id.to_string(),
        }
    }

    pub fn package_not_found(id: impl ToString) -> Self {
        ShipmentError::NotFound {
            entity: "Package",
            id: id.to_string(),
        }
    }
}

impl From<CatalogError> for ShipmentError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => ShipmentError::Validation(msg),
            CatalogError::Ineligible { product, mode } => ShipmentError::IneligibleProduct { product, mode },
            CatalogError::CapacityExceeded { requested, available } => {
                ShipmentError::CapacityExceeded { requested, available }
            }
        }
    }
}

pub type ShipmentResult<T> = Result<T, ShipmentError>;
