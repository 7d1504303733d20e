use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use freight_catalog::{ProductKind, TransportMode};
use crate::models::{LifecycleState, Package, PackageState, ProgressState, Shipment};

/// Criteria for listing shipments. Empty criteria match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentFilter {
    pub transport_mode: Option<TransportMode>,
    pub progress: Option<ProgressState>,
    pub lifecycle: Option<LifecycleState>,
    /// Case-insensitive match on origin, destination or shipment number
    pub text: Option<String>,
}

impl ShipmentFilter {
    pub fn matches(&self, shipment: &Shipment) -> bool {
        if let Some(mode) = self.transport_mode {
            if shipment.transport_mode != mode {
                return false;
            }
        }
        if let Some(progress) = self.progress {
            if shipment.progress != progress {
                return false;
            }
        }
        if let Some(lifecycle) = self.lifecycle {
            if shipment.lifecycle != lifecycle {
                return false;
            }
        }
        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            let haystacks = [
                &shipment.number,
                &shipment.route.origin.name,
                &shipment.route.destination.name,
            ];
            if !haystacks.iter().any(|h| h.to_lowercase().contains(&needle)) {
                return false;
            }
        }
        true
    }
}

/// Criteria for listing packages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageFilter {
    pub state: Option<PackageState>,
    pub shipment_id: Option<Uuid>,
    pub product: Option<ProductKind>,
    /// Sender or recipient phone
    pub phone: Option<String>,
}

impl PackageFilter {
    pub fn matches(&self, package: &Package) -> bool {
        if let Some(state) = self.state {
            if package.state != state {
                return false;
            }
        }
        if let Some(shipment_id) = self.shipment_id {
            if package.shipment_id != shipment_id {
                return false;
            }
        }
        if let Some(kind) = self.product {
            if package.product.kind() != kind {
                return false;
            }
        }
        if let Some(phone) = self.phone.as_deref() {
            if package.sender.phone() != phone && package.recipient.phone() != phone {
                return false;
            }
        }
        true
    }
}

/// What a recipient sees when tracking a package by code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingView {
    pub recipient_code: String,
    pub package_state: PackageState,
    pub product_label: String,
    pub unit_count: u32,
    pub shipment_number: String,
    pub transport_mode: TransportMode,
    pub shipment_progress: ProgressState,
    pub origin: String,
    pub destination: String,
    pub departed_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
}

impl TrackingView {
    pub fn new(package: &Package, shipment: &Shipment) -> Self {
        Self {
            recipient_code: package.recipient_code.clone(),
            package_state: package.state,
            product_label: package.product.label.clone(),
            unit_count: package.unit_count,
            shipment_number: shipment.number.clone(),
            transport_mode: shipment.transport_mode,
            shipment_progress: shipment.progress,
            origin: shipment.route.origin.name.clone(),
            destination: shipment.route.destination.name.clone(),
            departed_at: package.departed_at.or(shipment.departed_at),
            arrived_at: package.arrived_at,
        }
    }
}
