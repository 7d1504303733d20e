use serde::{Deserialize, Serialize};
use crate::CatalogError;

/// Tolerance for accumulated floating point error on weight sums
const WEIGHT_EPSILON: f64 = 1e-9;

/// Weight capacity tracking for one shipment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CapacityGauge {
    pub max_weight_kg: f64,
    pub loaded_weight_kg: f64,
}

impl CapacityGauge {
    pub fn new(max_weight_kg: f64, loaded_weight_kg: f64) -> Self {
        Self {
            max_weight_kg,
            loaded_weight_kg,
        }
    }

    pub fn available(&self) -> f64 {
        (self.max_weight_kg - self.loaded_weight_kg).max(0.0)
    }

    /// Check that `weight_kg` more fits without loading it.
    pub fn check(&self, weight_kg: f64) -> Result<(), CatalogError> {
        if self.loaded_weight_kg + weight_kg > self.max_weight_kg + WEIGHT_EPSILON {
            return Err(CatalogError::CapacityExceeded {
                requested: weight_kg,
                available: self.available(),
            });
        }
        Ok(())
    }

    /// Fraction of capacity in use, 0.0..=1.0
    pub fn utilization(&self) -> f64 {
        if self.max_weight_kg <= 0.0 {
            0.0
        } else {
            (self.loaded_weight_kg / self.max_weight_kg).min(1.0)
        }
    }
}
