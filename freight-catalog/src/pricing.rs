use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use crate::product::{Product, ProductKind};
use crate::tariff::{TariffInput, TariffTable};
use crate::transport::TransportMode;
use crate::CatalogError;

/// Minimum chargeable amount for any package
pub const DEFAULT_PRICE_FLOOR: i64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Minimum chargeable price per package
    pub price_floor: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_floor: DEFAULT_PRICE_FLOOR,
        }
    }
}

/// Price of one package
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub unit_price: i64,
    /// unit price × unit count, before the floor
    pub computed_price: i64,
    /// computed price raised to the floor
    pub final_price: i64,
}

/// Pure pricing functions over the tariff table
#[derive(Debug, Clone)]
pub struct PricingEngine {
    tariffs: TariffTable,
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(tariffs: TariffTable, config: PricingConfig) -> Self {
        Self { tariffs, config }
    }

    pub fn tariffs(&self) -> &TariffTable {
        &self.tariffs
    }

    pub fn price_floor(&self) -> i64 {
        self.config.price_floor
    }

    /// Reject a product/mode pair that has no tariff.
    pub fn ensure_eligible(&self, kind: ProductKind, mode: TransportMode) -> Result<(), CatalogError> {
        if self.tariffs.is_eligible(kind, mode) {
            Ok(())
        } else {
            Err(CatalogError::Ineligible { product: kind, mode })
        }
    }

    /// Price for a single unit, rounded to the nearest whole currency unit.
    pub fn unit_price(&self, product: &Product, mode: TransportMode, distance_km: f64) -> Result<i64, CatalogError> {
        to_amount(self.evaluate(product, mode, distance_km)?)
    }

    fn evaluate(&self, product: &Product, mode: TransportMode, distance_km: f64) -> Result<f64, CatalogError> {
        product.validate()?;

        let rule = self
            .tariffs
            .rule(product.kind(), mode)
            .ok_or(CatalogError::Ineligible {
                product: product.kind(),
                mode,
            })?;

        if !distance_km.is_finite() || distance_km <= 0.0 {
            return Err(CatalogError::Validation(format!(
                "distance must be positive, got {}",
                distance_km
            )));
        }

        let input = TariffInput {
            weight_kg: product.weight_kg,
            distance_km,
            toxicity_grade: product.product_type.toxicity_grade(),
        };

        Ok(rule.formula.evaluate(&input))
    }

    /// Price a package: unit price × unit count, then the floor.
    pub fn quote(
        &self,
        product: &Product,
        mode: TransportMode,
        distance_km: f64,
        unit_count: u32,
    ) -> Result<PriceQuote, CatalogError> {
        if unit_count == 0 {
            return Err(CatalogError::Validation("unit count must be at least 1".to_string()));
        }

        let exact = self.evaluate(product, mode, distance_km)?;
        let unit_price = to_amount(exact)?;
        // Rounded once, after multiplying
        let computed_price = to_amount(exact * f64::from(unit_count))?;

        Ok(PriceQuote {
            unit_price,
            computed_price,
            final_price: computed_price.max(self.config.price_floor),
        })
    }

    /// Shipment-level surcharges: each product kind present on board that
    /// carries a surcharge for this mode is charged once.
    pub fn shipment_surcharges<I>(&self, mode: TransportMode, kinds_on_board: I) -> i64
    where
        I: IntoIterator<Item = ProductKind>,
    {
        let present: BTreeSet<ProductKind> = kinds_on_board.into_iter().collect();

        present
            .into_iter()
            .filter_map(|kind| self.tariffs.rule(kind, mode))
            .map(|rule| rule.shipment_surcharge)
            .sum()
    }
}

/// Round to a whole currency amount, rejecting values an `i64` cannot hold.
fn to_amount(value: f64) -> Result<i64, CatalogError> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded.abs() >= i64::MAX as f64 {
        return Err(CatalogError::Validation(format!("price {} is out of range", value)));
    }
    Ok(rounded as i64)
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(TariffTable::standard(), PricingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_applies_to_small_packages() {
        let engine = PricingEngine::default();
        let product = Product::perishable("Bread", 1.0).unwrap();

        let quote = engine.quote(&product, TransportMode::Road, 1.0, 1).unwrap();
        assert_eq!(quote.unit_price, 100);
        assert_eq!(quote.computed_price, 100);
        assert_eq!(quote.final_price, 10_000);
    }

    #[test]
    fn test_per_mode_formulas() {
        let engine = PricingEngine::default();
        let fish = Product::perishable("Fish", 20.0).unwrap();
        let solvent = Product::chemical("Solvent", 10.0, 5).unwrap();
        let vase = Product::fragile("Vase", 3.0).unwrap();
        let steel = Product::unbreakable("Steel", 3.0).unwrap();

        assert_eq!(engine.unit_price(&fish, TransportMode::Road, 100.0).unwrap(), 200_000);
        assert_eq!(engine.unit_price(&fish, TransportMode::Sea, 100.0).unwrap(), 180_000);
        assert_eq!(engine.unit_price(&fish, TransportMode::Air, 100.0).unwrap(), 600_000);
        assert_eq!(engine.unit_price(&solvent, TransportMode::Sea, 100.0).unwrap(), 25_000);
        assert_eq!(engine.unit_price(&vase, TransportMode::Road, 10.0).unwrap(), 6_000);
        assert_eq!(engine.unit_price(&vase, TransportMode::Air, 10_000.0).unwrap(), 3_000);
        assert_eq!(engine.unit_price(&steel, TransportMode::Sea, 10.0).unwrap(), 12_000);
        assert_eq!(engine.unit_price(&steel, TransportMode::Air, 10.0).unwrap(), 3_000);
    }

    #[test]
    fn test_unit_count_multiplies_before_floor() {
        let engine = PricingEngine::default();
        let vase = Product::fragile("Vase", 3.0).unwrap();

        // 3 kg × 1000 = 3000 per unit, × 4 units = 12000
        let quote = engine.quote(&vase, TransportMode::Air, 500.0, 4).unwrap();
        assert_eq!(quote.computed_price, 12_000);
        assert_eq!(quote.final_price, 12_000);

        assert!(matches!(
            engine.quote(&vase, TransportMode::Air, 500.0, 0),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn test_fractional_unit_price_rounded_after_count() {
        let engine = PricingEngine::default();
        let tile = Product::fragile("Tile", 0.1234).unwrap();

        // 0.1234 kg × 1.5 km × 200 = 37.02 per unit
        let quote = engine.quote(&tile, TransportMode::Road, 1.5, 1000).unwrap();
        assert_eq!(quote.unit_price, 37);
        assert_eq!(quote.computed_price, 37_020);
        assert_eq!(quote.final_price, 37_020);
    }

    #[test]
    fn test_unrepresentable_price_rejected() {
        let engine = PricingEngine::default();
        let ore = Product::unbreakable("Ore", 1e17).unwrap();

        assert!(matches!(
            engine.quote(&ore, TransportMode::Sea, 1e6, 1),
            Err(CatalogError::Validation(_))
        ));
        // 1e17 kg × 1000 per kg is past i64::MAX
        assert!(matches!(
            engine.unit_price(&ore, TransportMode::Air, 1.0),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn test_ineligible_pairs() {
        let engine = PricingEngine::default();
        let solvent = Product::chemical("Solvent", 10.0, 5).unwrap();
        let vase = Product::fragile("Vase", 3.0).unwrap();

        assert_eq!(
            engine.unit_price(&solvent, TransportMode::Road, 10.0),
            Err(CatalogError::Ineligible {
                product: ProductKind::Chemical,
                mode: TransportMode::Road
            })
        );
        assert!(engine.ensure_eligible(ProductKind::Chemical, TransportMode::Air).is_err());
        assert!(engine.unit_price(&vase, TransportMode::Sea, 10.0).is_err());
    }

    #[test]
    fn test_surcharges_charged_once_per_kind() {
        let engine = PricingEngine::default();

        let kinds = vec![
            ProductKind::Perishable,
            ProductKind::Perishable,
            ProductKind::Chemical,
            ProductKind::UnbreakableMaterial,
        ];
        assert_eq!(engine.shipment_surcharges(TransportMode::Sea, kinds), 15_000);
        assert_eq!(
            engine.shipment_surcharges(TransportMode::Road, vec![ProductKind::Perishable]),
            0
        );
        assert_eq!(engine.shipment_surcharges(TransportMode::Sea, Vec::new()), 0);
    }

    #[test]
    fn test_non_positive_distance_rejected() {
        let engine = PricingEngine::default();
        let fish = Product::perishable("Fish", 1.0).unwrap();
        assert!(matches!(
            engine.unit_price(&fish, TransportMode::Road, 0.0),
            Err(CatalogError::Validation(_))
        ));
    }
}
