use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use freight_catalog::{CapacityGauge, PricingEngine, Product, TransportMode};
use freight_shared::Masked;
use crate::ShipmentError;

/// Physical progress of a shipment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressState {
    Pending,
    InTransit,
    Arrived,
}

/// Administrative openness of a shipment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Open,
    Closed,
}

/// Package status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageState {
    Pending,
    InTransit,
    Arrived,
    Recovered,
    Lost,
    Archived,
    Cancelled,
}

impl ProgressState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressState::Pending => "PENDING",
            ProgressState::InTransit => "IN_TRANSIT",
            ProgressState::Arrived => "ARRIVED",
        }
    }
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Open => "OPEN",
            LifecycleState::Closed => "CLOSED",
        }
    }
}

impl PackageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageState::Pending => "PENDING",
            PackageState::InTransit => "IN_TRANSIT",
            PackageState::Arrived => "ARRIVED",
            PackageState::Recovered => "RECOVERED",
            PackageState::Lost => "LOST",
            PackageState::Archived => "ARCHIVED",
            PackageState::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub origin: Place,
    pub destination: Place,
}

impl Route {
    pub fn describe(&self) -> String {
        format!("{} -> {}", self.origin.name, self.destination.name)
    }
}

/// Party of a package. Embedded by value, not a live link to the client record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: String,
    pub phone: Masked<String>,
    #[serde(default)]
    pub email: Option<Masked<String>>,
    pub address: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: Masked(phone.into()),
            email: None,
            address: address.into(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(Masked(email.into()));
        self
    }

    pub fn phone(&self) -> &str {
        self.phone.expose()
    }

    pub fn validate(&self, role: &str) -> Result<(), ShipmentError> {
        if self.name.trim().is_empty() {
            return Err(ShipmentError::Validation(format!("{} name must not be empty", role)));
        }
        if self.phone.expose().trim().is_empty() {
            return Err(ShipmentError::Validation(format!("{} phone must not be empty", role)));
        }
        Ok(())
    }
}

/// Known sender or recipient, deduplicated by phone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub name: String,
    pub phone: Masked<String>,
    pub email: Option<Masked<String>>,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn from_contact(contact: &Contact, now: DateTime<Utc>) -> Self {
        Self {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            address: contact.address.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh from a newer contact. An e-mail already on file survives a
    /// contact that has none.
    pub fn merge(&mut self, contact: &Contact, now: DateTime<Utc>) {
        self.name = contact.name.clone();
        self.address = contact.address.clone();
        if contact.email.is_some() {
            self.email = contact.email.clone();
        }
        self.updated_at = now;
    }

    pub fn phone(&self) -> &str {
        self.phone.expose()
    }
}

/// A batch transport unit on one mode between two places
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub number: String,
    pub max_weight_kg: f64,
    pub route: Route,
    pub distance_km: f64,
    pub transport_mode: TransportMode,
    pub progress: ProgressState,
    pub lifecycle: LifecycleState,
    pub package_ids: Vec<Uuid>,
    pub loaded_weight_kg: f64,
    pub surcharge_total: i64,
    pub total_revenue: i64,
    pub created_at: DateTime<Utc>,
    pub departed_at: Option<DateTime<Utc>>,
    pub actual_arrival_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    pub fn capacity(&self) -> CapacityGauge {
        CapacityGauge::new(self.max_weight_kg, self.loaded_weight_kg)
    }

    pub fn contains(&self, package_id: &Uuid) -> bool {
        self.package_ids.contains(package_id)
    }

    /// Recompute loaded weight, surcharges and revenue from the packages
    /// currently on the manifest.
    pub fn recompute_totals<'a, I>(&mut self, manifest: I, engine: &PricingEngine) -> Result<(), ShipmentError>
    where
        I: IntoIterator<Item = &'a Package>,
    {
        let on_board: Vec<&Package> = manifest
            .into_iter()
            .filter(|p| self.contains(&p.id) && p.state != PackageState::Cancelled)
            .collect();

        self.loaded_weight_kg = on_board.iter().map(|p| p.total_weight()).sum();
        self.surcharge_total = engine.shipment_surcharges(
            self.transport_mode,
            on_board.iter().map(|p| p.product.kind()),
        );
        self.total_revenue = on_board
            .iter()
            .try_fold(self.surcharge_total, |total, p| total.checked_add(p.final_price))
            .ok_or_else(|| {
                ShipmentError::Validation(format!("revenue of shipment {} is out of range", self.number))
            })?;
        Ok(())
    }
}

/// A priced, tracked parcel belonging to exactly one shipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub sender: Contact,
    pub recipient: Contact,
    pub product: Product,
    pub transport_mode: TransportMode,
    pub unit_count: u32,
    pub unit_price: i64,
    pub computed_price: i64,
    pub final_price: i64,
    pub state: PackageState,
    pub recipient_code: String,
    pub created_at: DateTime<Utc>,
    pub departed_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    /// When the package was recovered or declared lost
    pub resolved_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    /// weight × unit count
    pub fn total_weight(&self) -> f64 {
        self.product.weight_kg * f64::from(self.unit_count)
    }
}
