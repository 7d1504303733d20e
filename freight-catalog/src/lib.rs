pub mod product;
pub mod transport;
pub mod tariff;
pub mod pricing;
pub mod capacity;

pub use product::{Product, ProductKind, ProductType, MAX_TOXICITY_GRADE, MIN_TOXICITY_GRADE};
pub use transport::TransportMode;
pub use tariff::{PricingFormula, TariffInput, TariffRule, TariffTable};
pub use pricing::{PriceQuote, PricingConfig, PricingEngine, DEFAULT_PRICE_FLOOR};
pub use capacity::CapacityGauge;

/// Catalog and tariff errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Product {product} cannot travel by {mode}")]
    Ineligible {
        product: ProductKind,
        mode: TransportMode,
    },

    #[error("Capacity exceeded: requested {requested} kg, available {available} kg")]
    CapacityExceeded {
        requested: f64,
        available: f64,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;
