use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use freight_catalog::TransportMode;
use crate::models::{LifecycleState, Package, PackageState, ProgressState, Route, Shipment};
use crate::ShipmentError;

/// Validated inputs for a new shipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentDraft {
    pub route: Route,
    pub distance_km: f64,
    pub max_weight_kg: f64,
    pub transport_mode: TransportMode,
}

impl ShipmentDraft {
    pub fn validate(&self) -> Result<(), ShipmentError> {
        if self.route.origin.name.trim().is_empty() || self.route.destination.name.trim().is_empty() {
            return Err(ShipmentError::Validation("origin and destination must not be empty".to_string()));
        }
        if !self.max_weight_kg.is_finite() || self.max_weight_kg <= 0.0 {
            return Err(ShipmentError::Validation(format!(
                "max weight must be positive, got {}",
                self.max_weight_kg
            )));
        }
        if !self.distance_km.is_finite() || self.distance_km <= 0.0 {
            return Err(ShipmentError::Validation(format!(
                "distance must be positive, got {} km for {}",
                self.distance_km,
                self.route.describe()
            )));
        }
        Ok(())
    }
}

impl Shipment {
    /// New empty shipment: PENDING and OPEN.
    pub fn open(draft: ShipmentDraft, number: String, now: DateTime<Utc>) -> Result<Self, ShipmentError> {
        draft.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            number,
            max_weight_kg: draft.max_weight_kg,
            route: draft.route,
            distance_km: draft.distance_km,
            transport_mode: draft.transport_mode,
            progress: ProgressState::Pending,
            lifecycle: LifecycleState::Open,
            package_ids: Vec::new(),
            loaded_weight_kg: 0.0,
            surcharge_total: 0,
            total_revenue: 0,
            created_at: now,
            departed_at: None,
            actual_arrival_at: None,
            updated_at: now,
        })
    }

    /// Transition: OPEN → CLOSED
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        if self.lifecycle != LifecycleState::Open {
            return Err(ShipmentError::InvalidState(format!(
                "shipment {} is already {}",
                self.number, self.lifecycle
            )));
        }

        self.lifecycle = LifecycleState::Closed;
        self.updated_at = now;
        Ok(())
    }

    /// Transition: CLOSED → OPEN, only before departure
    pub fn reopen(&mut self, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        if self.progress != ProgressState::Pending {
            return Err(ShipmentError::InvalidState(format!(
                "shipment {} cannot be reopened while {}",
                self.number, self.progress
            )));
        }
        if self.lifecycle != LifecycleState::Closed {
            return Err(ShipmentError::InvalidState(format!(
                "shipment {} is already {}",
                self.number, self.lifecycle
            )));
        }

        self.lifecycle = LifecycleState::Open;
        self.updated_at = now;
        Ok(())
    }

    /// Transition: PENDING → IN_TRANSIT. Every PENDING package on the
    /// manifest departs with the shipment. Returns the departed package ids.
    pub fn start(&mut self, manifest: &mut [Package], now: DateTime<Utc>) -> Result<Vec<Uuid>, ShipmentError> {
        if self.progress != ProgressState::Pending {
            return Err(ShipmentError::InvalidState(format!(
                "shipment {} has already left ({})",
                self.number, self.progress
            )));
        }
        if self.lifecycle != LifecycleState::Closed {
            return Err(ShipmentError::InvalidState(format!(
                "shipment {} must be closed before departure",
                self.number
            )));
        }
        if self.package_ids.is_empty() {
            return Err(ShipmentError::InvalidState(format!(
                "shipment {} has no packages",
                self.number
            )));
        }
        self.ensure_manifest_loaded(manifest)?;

        let mut departed = Vec::new();
        for package in manifest.iter_mut() {
            if self.contains(&package.id) && package.state == PackageState::Pending {
                package.depart(now)?;
                departed.push(package.id);
            }
        }

        self.progress = ProgressState::InTransit;
        self.departed_at = Some(now);
        self.updated_at = now;
        Ok(departed)
    }

    /// Transition: IN_TRANSIT → ARRIVED. Every IN_TRANSIT package on the
    /// manifest arrives; RECOVERED/LOST packages are left alone. Returns the
    /// arrived package ids.
    pub fn mark_arrived(&mut self, manifest: &mut [Package], now: DateTime<Utc>) -> Result<Vec<Uuid>, ShipmentError> {
        if self.progress != ProgressState::InTransit {
            return Err(ShipmentError::InvalidState(format!(
                "shipment {} is {}, expected IN_TRANSIT",
                self.number, self.progress
            )));
        }
        self.ensure_manifest_loaded(manifest)?;

        let mut arrived = Vec::new();
        for package in manifest.iter_mut() {
            if self.contains(&package.id) && package.state == PackageState::InTransit {
                package.arrive(now)?;
                arrived.push(package.id);
            }
        }

        self.progress = ProgressState::Arrived;
        self.actual_arrival_at = Some(now);
        self.updated_at = now;
        Ok(arrived)
    }

    /// Cascades only touch what was loaded; a partial manifest would leave
    /// packages behind in the old state.
    fn ensure_manifest_loaded(&self, manifest: &[Package]) -> Result<(), ShipmentError> {
        for id in &self.package_ids {
            if !manifest.iter().any(|p| p.id == *id) {
                return Err(ShipmentError::package_not_found(id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{admit, AdmissionRequest};
    use crate::models::{Contact, Place};
    use freight_catalog::{PricingEngine, Product};

    fn draft(mode: TransportMode) -> ShipmentDraft {
        ShipmentDraft {
            route: Route {
                origin: Place { name: "Dakar".to_string(), lat: 14.69, lon: -17.44 },
                destination: Place { name: "Ziguinchor".to_string(), lat: 12.58, lon: -16.27 },
            },
            distance_km: 100.0,
            max_weight_kg: 500.0,
            transport_mode: mode,
        }
    }

    fn loaded_shipment(count: usize) -> (Shipment, Vec<Package>) {
        let engine = PricingEngine::default();
        let now = Utc::now();
        let mut shipment = Shipment::open(draft(TransportMode::Road), "SHP-000001".to_string(), now).unwrap();
        let mut manifest = Vec::new();

        for i in 0..count {
            let request = AdmissionRequest {
                sender: Contact::new("Awa", "+221770000001", "Dakar"),
                recipient: Contact::new("Moussa", format!("+22177000010{}", i), "Ziguinchor"),
                product: Product::perishable("Mangoes", 5.0).unwrap(),
                transport_mode: TransportMode::Road,
                unit_count: 1,
            };
            let package = admit(&mut shipment, &manifest, request, &engine, now).unwrap();
            manifest.push(package);
        }

        (shipment, manifest)
    }

    #[test]
    fn test_shipment_lifecycle() {
        let (mut shipment, mut manifest) = loaded_shipment(2);
        let now = Utc::now();

        // Open shipments cannot leave
        assert!(matches!(shipment.start(&mut manifest, now), Err(ShipmentError::InvalidState(_))));

        shipment.close(now).unwrap();
        assert!(matches!(shipment.close(now), Err(ShipmentError::InvalidState(_))));

        let departed = shipment.start(&mut manifest, now).unwrap();
        assert_eq!(departed.len(), 2);
        assert_eq!(shipment.progress, ProgressState::InTransit);
        assert!(shipment.departed_at.is_some());
        assert!(manifest.iter().all(|p| p.state == PackageState::InTransit));

        // No reopening once on the move, no second departure
        assert!(matches!(shipment.reopen(now), Err(ShipmentError::InvalidState(_))));
        assert!(matches!(shipment.start(&mut manifest, now), Err(ShipmentError::InvalidState(_))));

        let arrived = shipment.mark_arrived(&mut manifest, now).unwrap();
        assert_eq!(arrived.len(), 2);
        assert_eq!(shipment.progress, ProgressState::Arrived);
        assert!(manifest.iter().all(|p| p.state == PackageState::Arrived && p.arrived_at.is_some()));

        assert!(matches!(shipment.mark_arrived(&mut manifest, now), Err(ShipmentError::InvalidState(_))));
    }

    #[test]
    fn test_start_requires_packages() {
        let now = Utc::now();
        let mut shipment = Shipment::open(draft(TransportMode::Air), "SHP-000002".to_string(), now).unwrap();
        shipment.close(now).unwrap();

        let result = shipment.start(&mut [], now);
        assert!(matches!(result, Err(ShipmentError::InvalidState(_))));
        assert_eq!(shipment.progress, ProgressState::Pending);
    }

    #[test]
    fn test_reopen_before_departure() {
        let now = Utc::now();
        let mut shipment = Shipment::open(draft(TransportMode::Sea), "SHP-000003".to_string(), now).unwrap();

        assert!(matches!(shipment.reopen(now), Err(ShipmentError::InvalidState(_))));
        shipment.close(now).unwrap();
        shipment.reopen(now).unwrap();
        assert_eq!(shipment.lifecycle, LifecycleState::Open);
    }

    #[test]
    fn test_arrival_leaves_resolved_packages_alone() {
        let (mut shipment, mut manifest) = loaded_shipment(3);
        let now = Utc::now();
        shipment.close(now).unwrap();
        shipment.start(&mut manifest, now).unwrap();

        manifest[0].mark_lost(now).unwrap();

        let arrived = shipment.mark_arrived(&mut manifest, now).unwrap();
        assert_eq!(arrived, vec![manifest[1].id, manifest[2].id]);
        assert_eq!(manifest[0].state, PackageState::Lost);
        assert!(manifest[0].arrived_at.is_none());
    }

    #[test]
    fn test_partial_manifest_rejected() {
        let (mut shipment, mut manifest) = loaded_shipment(2);
        let now = Utc::now();
        shipment.close(now).unwrap();

        let missing = manifest.pop().unwrap();
        let result = shipment.start(&mut manifest, now);
        assert_eq!(result, Err(ShipmentError::package_not_found(missing.id)));
        assert_eq!(shipment.progress, ProgressState::Pending);
        assert_eq!(manifest[0].state, PackageState::Pending);
    }

    #[test]
    fn test_draft_validation() {
        let mut bad = draft(TransportMode::Road);
        bad.max_weight_kg = 0.0;
        assert!(matches!(bad.validate(), Err(ShipmentError::Validation(_))));

        let mut bad = draft(TransportMode::Road);
        bad.distance_km = 0.0;
        assert!(matches!(bad.validate(), Err(ShipmentError::Validation(_))));

        let mut bad = draft(TransportMode::Road);
        bad.route.origin.name = String::new();
        assert!(matches!(bad.validate(), Err(ShipmentError::Validation(_))));
    }
}
