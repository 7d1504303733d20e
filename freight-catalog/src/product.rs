use serde::{Deserialize, Serialize};
use std::fmt;
use crate::CatalogError;

pub const MIN_TOXICITY_GRADE: u8 = 1;
pub const MAX_TOXICITY_GRADE: u8 = 10;

/// Product category without its payload; the key used by the tariff table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    Perishable,
    Chemical,
    FragileMaterial,
    UnbreakableMaterial,
}

impl ProductKind {
    pub const ALL: [ProductKind; 4] = [
        ProductKind::Perishable,
        ProductKind::Chemical,
        ProductKind::FragileMaterial,
        ProductKind::UnbreakableMaterial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Perishable => "PERISHABLE",
            ProductKind::Chemical => "CHEMICAL",
            ProductKind::FragileMaterial => "FRAGILE_MATERIAL",
            ProductKind::UnbreakableMaterial => "UNBREAKABLE_MATERIAL",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product category as carried by a package
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Perishable,
    Chemical { toxicity_grade: u8 },
    FragileMaterial,
    UnbreakableMaterial,
}

impl ProductType {
    pub fn kind(&self) -> ProductKind {
        match self {
            ProductType::Perishable => ProductKind::Perishable,
            ProductType::Chemical { .. } => ProductKind::Chemical,
            ProductType::FragileMaterial => ProductKind::FragileMaterial,
            ProductType::UnbreakableMaterial => ProductKind::UnbreakableMaterial,
        }
    }

    pub fn toxicity_grade(&self) -> Option<u8> {
        match self {
            ProductType::Chemical { toxicity_grade } => Some(*toxicity_grade),
            _ => None,
        }
    }
}

/// A product handed off by a sender: what it is and how much one unit weighs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub label: String,
    pub weight_kg: f64,
    pub product_type: ProductType,
}

impl Product {
    pub fn new(label: impl Into<String>, weight_kg: f64, product_type: ProductType) -> Result<Self, CatalogError> {
        let product = Self {
            label: label.into(),
            weight_kg,
            product_type,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn perishable(label: impl Into<String>, weight_kg: f64) -> Result<Self, CatalogError> {
        Self::new(label, weight_kg, ProductType::Perishable)
    }

    pub fn chemical(label: impl Into<String>, weight_kg: f64, toxicity_grade: u8) -> Result<Self, CatalogError> {
        Self::new(label, weight_kg, ProductType::Chemical { toxicity_grade })
    }

    pub fn fragile(label: impl Into<String>, weight_kg: f64) -> Result<Self, CatalogError> {
        Self::new(label, weight_kg, ProductType::FragileMaterial)
    }

    pub fn unbreakable(label: impl Into<String>, weight_kg: f64) -> Result<Self, CatalogError> {
        Self::new(label, weight_kg, ProductType::UnbreakableMaterial)
    }

    pub fn kind(&self) -> ProductKind {
        self.product_type.kind()
    }

    /// Checks label, weight and toxicity grade.
    /// Records deserialized from outside are not trusted to have gone through `new`.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.label.trim().is_empty() {
            return Err(CatalogError::Validation("product label must not be empty".to_string()));
        }

        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            return Err(CatalogError::Validation(format!(
                "product weight must be positive, got {}",
                self.weight_kg
            )));
        }

        if let Some(grade) = self.product_type.toxicity_grade() {
            if !(MIN_TOXICITY_GRADE..=MAX_TOXICITY_GRADE).contains(&grade) {
                return Err(CatalogError::Validation(format!(
                    "toxicity grade must be between {} and {}, got {}",
                    MIN_TOXICITY_GRADE, MAX_TOXICITY_GRADE, grade
                )));
            }
        }

        Ok(())
    }
}
