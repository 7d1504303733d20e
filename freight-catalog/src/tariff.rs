use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::product::ProductKind;
use crate::transport::TransportMode;

/// Inputs a per-unit formula may draw on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TariffInput {
    pub weight_kg: f64,
    pub distance_km: f64,
    pub toxicity_grade: Option<u8>,
}

/// Per-unit price formula for one (product, mode) pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "formula", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingFormula {
    /// weight × rate × distance
    PerKgKm { rate: f64 },
    /// weight × rate × toxicity grade
    PerKgToxicity { rate: f64 },
    /// weight × rate, distance ignored
    PerKg { rate: f64 },
}

impl PricingFormula {
    pub fn evaluate(&self, input: &TariffInput) -> f64 {
        match *self {
            PricingFormula::PerKgKm { rate } => input.weight_kg * rate * input.distance_km,
            PricingFormula::PerKgToxicity { rate } => {
                input.weight_kg * rate * f64::from(input.toxicity_grade.unwrap_or(0))
            }
            PricingFormula::PerKg { rate } => input.weight_kg * rate,
        }
    }
}

/// One cell of the eligibility/tariff matrix. Presence of a rule means the
/// product may travel on the mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TariffRule {
    pub formula: PricingFormula,
    /// Flat amount charged once per shipment when at least one package of
    /// this product kind is on board. Zero means no surcharge.
    #[serde(default)]
    pub shipment_surcharge: i64,
}

impl TariffRule {
    pub fn new(formula: PricingFormula) -> Self {
        Self {
            formula,
            shipment_surcharge: 0,
        }
    }

    pub fn with_surcharge(mut self, amount: i64) -> Self {
        self.shipment_surcharge = amount;
        self
    }
}

/// Lookup matrix keyed by (product kind, transport mode)
#[derive(Debug, Clone, Default)]
pub struct TariffTable {
    rules: HashMap<(ProductKind, TransportMode), TariffRule>,
}

impl TariffTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The operator's published tariff.
    pub fn standard() -> Self {
        use PricingFormula::*;
        use ProductKind::*;
        use TransportMode::*;

        let mut table = Self::empty();

        table.insert(Perishable, Road, TariffRule::new(PerKgKm { rate: 100.0 }));
        table.insert(Perishable, Sea, TariffRule::new(PerKgKm { rate: 90.0 }).with_surcharge(5_000));
        table.insert(Perishable, Air, TariffRule::new(PerKgKm { rate: 300.0 }));

        table.insert(Chemical, Sea, TariffRule::new(PerKgToxicity { rate: 500.0 }).with_surcharge(10_000));

        table.insert(FragileMaterial, Road, TariffRule::new(PerKgKm { rate: 200.0 }));
        table.insert(FragileMaterial, Air, TariffRule::new(PerKg { rate: 1_000.0 }));

        table.insert(UnbreakableMaterial, Road, TariffRule::new(PerKgKm { rate: 200.0 }));
        table.insert(UnbreakableMaterial, Sea, TariffRule::new(PerKgKm { rate: 400.0 }));
        table.insert(UnbreakableMaterial, Air, TariffRule::new(PerKg { rate: 1_000.0 }));

        table
    }

    /// Add or replace a cell. Returns the previous rule, if any.
    pub fn insert(&mut self, kind: ProductKind, mode: TransportMode, rule: TariffRule) -> Option<TariffRule> {
        self.rules.insert((kind, mode), rule)
    }

    pub fn rule(&self, kind: ProductKind, mode: TransportMode) -> Option<&TariffRule> {
        self.rules.get(&(kind, mode))
    }

    pub fn is_eligible(&self, kind: ProductKind, mode: TransportMode) -> bool {
        self.rules.contains_key(&(kind, mode))
    }

    pub fn eligible_modes(&self, kind: ProductKind) -> Vec<TransportMode> {
        TransportMode::ALL
            .into_iter()
            .filter(|mode| self.is_eligible(kind, *mode))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_eligibility_matrix() {
        let table = TariffTable::standard();

        assert_eq!(
            table.eligible_modes(ProductKind::Perishable),
            vec![TransportMode::Road, TransportMode::Sea, TransportMode::Air]
        );
        assert_eq!(table.eligible_modes(ProductKind::Chemical), vec![TransportMode::Sea]);
        assert_eq!(
            table.eligible_modes(ProductKind::FragileMaterial),
            vec![TransportMode::Road, TransportMode::Air]
        );
        assert_eq!(
            table.eligible_modes(ProductKind::UnbreakableMaterial),
            vec![TransportMode::Road, TransportMode::Sea, TransportMode::Air]
        );
    }

    #[test]
    fn test_formulas() {
        let input = TariffInput {
            weight_kg: 2.0,
            distance_km: 50.0,
            toxicity_grade: Some(3),
        };

        assert_eq!(PricingFormula::PerKgKm { rate: 100.0 }.evaluate(&input), 10_000.0);
        assert_eq!(PricingFormula::PerKgToxicity { rate: 500.0 }.evaluate(&input), 3_000.0);
        assert_eq!(PricingFormula::PerKg { rate: 1_000.0 }.evaluate(&input), 2_000.0);
    }

    #[test]
    fn test_pairs_can_be_added_independently() {
        let mut table = TariffTable::standard();
        assert!(!table.is_eligible(ProductKind::Chemical, TransportMode::Road));

        table.insert(
            ProductKind::Chemical,
            TransportMode::Road,
            TariffRule::new(PricingFormula::PerKgToxicity { rate: 800.0 }),
        );

        assert!(table.is_eligible(ProductKind::Chemical, TransportMode::Road));
        assert!(!table.is_eligible(ProductKind::Chemical, TransportMode::Air));
        assert_eq!(
            table.eligible_modes(ProductKind::Chemical),
            vec![TransportMode::Road, TransportMode::Sea]
        );
    }

    #[test]
    fn test_rule_deserialization() {
        let json = r#"{ "formula": { "formula": "PER_KG_KM", "rate": 90.0 }, "shipment_surcharge": 5000 }"#;
        let rule: TariffRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.formula, PricingFormula::PerKgKm { rate: 90.0 });
        assert_eq!(rule.shipment_surcharge, 5000);
    }
}
