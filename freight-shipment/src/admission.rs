use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use freight_catalog::{PricingEngine, Product, TransportMode};
use crate::codes::generate_recipient_code;
use crate::models::{Contact, LifecycleState, Package, PackageState, Shipment};
use crate::ShipmentError;

/// A package handed off by a sender for a given shipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionRequest {
    pub sender: Contact,
    pub recipient: Contact,
    pub product: Product,
    pub transport_mode: TransportMode,
    #[serde(default = "default_unit_count")]
    pub unit_count: u32,
}

fn default_unit_count() -> u32 {
    1
}

impl AdmissionRequest {
    pub fn validate(&self) -> Result<(), ShipmentError> {
        self.sender.validate("sender")?;
        self.recipient.validate("recipient")?;
        self.product.validate()?;
        if self.unit_count == 0 {
            return Err(ShipmentError::Validation("unit count must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn total_weight(&self) -> f64 {
        self.product.weight_kg * f64::from(self.unit_count)
    }
}

/// Add a package to an open shipment. `manifest` holds the packages already
/// on board. On success the shipment's manifest, weight and revenue include
/// the new package, which is returned for persisting.
pub fn admit(
    shipment: &mut Shipment,
    manifest: &[Package],
    request: AdmissionRequest,
    engine: &PricingEngine,
    now: DateTime<Utc>,
) -> Result<Package, ShipmentError> {
    request.validate()?;

    if shipment.lifecycle != LifecycleState::Open {
        return Err(ShipmentError::InvalidState(format!(
            "shipment {} is {}, packages can only be added while OPEN",
            shipment.number, shipment.lifecycle
        )));
    }

    if shipment.transport_mode != request.transport_mode {
        return Err(ShipmentError::ModeMismatch {
            shipment_mode: shipment.transport_mode,
            requested: request.transport_mode,
        });
    }

    engine.ensure_eligible(request.product.kind(), shipment.transport_mode)?;

    let mut gauge = shipment.capacity();
    gauge.loaded_weight_kg = on_board_weight(shipment, manifest);
    gauge.check(request.total_weight())?;

    let quote = engine.quote(
        &request.product,
        shipment.transport_mode,
        shipment.distance_km,
        request.unit_count,
    )?;

    let package = Package {
        id: Uuid::new_v4(),
        shipment_id: shipment.id,
        sender: request.sender,
        recipient: request.recipient,
        product: request.product,
        transport_mode: shipment.transport_mode,
        unit_count: request.unit_count,
        unit_price: quote.unit_price,
        computed_price: quote.computed_price,
        final_price: quote.final_price,
        state: PackageState::Pending,
        recipient_code: generate_recipient_code(),
        created_at: now,
        departed_at: None,
        arrived_at: None,
        resolved_at: None,
        archived_at: None,
        updated_at: now,
    };

    // Totals are checked on a copy so a rejected package leaves the shipment untouched
    let mut updated = shipment.clone();
    updated.package_ids.push(package.id);
    updated.recompute_totals(manifest.iter().chain(std::iter::once(&package)), engine)?;
    updated.updated_at = now;
    *shipment = updated;

    Ok(package)
}

/// Cancel a PENDING package and take it off the manifest, freeing its
/// capacity. Only while the shipment is still OPEN.
pub fn withdraw(
    shipment: &mut Shipment,
    manifest: &mut [Package],
    package_id: Uuid,
    engine: &PricingEngine,
    now: DateTime<Utc>,
) -> Result<(), ShipmentError> {
    if shipment.lifecycle != LifecycleState::Open {
        return Err(ShipmentError::InvalidState(format!(
            "shipment {} is {}, packages can only be withdrawn while OPEN",
            shipment.number, shipment.lifecycle
        )));
    }

    if !shipment.contains(&package_id) {
        return Err(ShipmentError::package_not_found(package_id));
    }

    let package = manifest
        .iter_mut()
        .find(|p| p.id == package_id)
        .ok_or_else(|| ShipmentError::package_not_found(package_id))?;

    package.cancel(now)?;

    shipment.package_ids.retain(|id| *id != package_id);
    shipment.recompute_totals(manifest.iter(), engine)?;
    shipment.updated_at = now;

    Ok(())
}

fn on_board_weight(shipment: &Shipment, manifest: &[Package]) -> f64 {
    manifest
        .iter()
        .filter(|p| shipment.contains(&p.id) && p.state != PackageState::Cancelled)
        .map(|p| p.total_weight())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ShipmentDraft;
    use crate::models::{Place, Route};
    use freight_catalog::ProductKind;

    fn shipment(mode: TransportMode, max_weight_kg: f64) -> Shipment {
        let draft = ShipmentDraft {
            route: Route {
                origin: Place { name: "Dakar".to_string(), lat: 14.69, lon: -17.44 },
                destination: Place { name: "Banjul".to_string(), lat: 13.45, lon: -16.58 },
            },
            distance_km: 100.0,
            max_weight_kg,
            transport_mode: mode,
        };
        Shipment::open(draft, "SHP-000010".to_string(), Utc::now()).unwrap()
    }

    fn request(product: Product, mode: TransportMode, unit_count: u32) -> AdmissionRequest {
        AdmissionRequest {
            sender: Contact::new("Awa", "+221770000001", "Dakar").with_email("awa@example.com"),
            recipient: Contact::new("Lamin", "+220300000001", "Banjul"),
            product,
            transport_mode: mode,
            unit_count,
        }
    }

    #[test]
    fn test_sea_revenue_with_surcharges() {
        let engine = PricingEngine::default();
        let now = Utc::now();
        let mut ship = shipment(TransportMode::Sea, 1_000.0);
        let mut manifest = Vec::new();

        let fish = admit(
            &mut ship,
            &manifest,
            request(Product::perishable("Fish", 20.0).unwrap(), TransportMode::Sea, 1),
            &engine,
            now,
        )
        .unwrap();
        assert_eq!(fish.final_price, 180_000);
        assert_eq!(ship.total_revenue, 185_000);
        manifest.push(fish);

        let solvent = admit(
            &mut ship,
            &manifest,
            request(Product::chemical("Solvent", 10.0, 5).unwrap(), TransportMode::Sea, 1),
            &engine,
            now,
        )
        .unwrap();
        assert_eq!(solvent.final_price, 25_000);
        manifest.push(solvent);

        assert_eq!(ship.surcharge_total, 15_000);
        assert_eq!(ship.total_revenue, 220_000);
        assert_eq!(ship.package_ids.len(), 2);
        assert_eq!(ship.loaded_weight_kg, 30.0);
    }

    #[test]
    fn test_check_order() {
        let engine = PricingEngine::default();
        let now = Utc::now();

        // Mode mismatch wins over eligibility
        let mut road = shipment(TransportMode::Road, 10.0);
        let result = admit(
            &mut road,
            &[],
            request(Product::chemical("Acid", 1.0, 2).unwrap(), TransportMode::Sea, 1),
            &engine,
            now,
        );
        assert_eq!(
            result.unwrap_err(),
            ShipmentError::ModeMismatch {
                shipment_mode: TransportMode::Road,
                requested: TransportMode::Sea
            }
        );

        // Eligibility wins over capacity
        let result = admit(
            &mut road,
            &[],
            request(Product::chemical("Acid", 100.0, 2).unwrap(), TransportMode::Road, 1),
            &engine,
            now,
        );
        assert_eq!(
            result.unwrap_err(),
            ShipmentError::IneligibleProduct {
                product: ProductKind::Chemical,
                mode: TransportMode::Road
            }
        );

        // Closed wins over everything after existence
        road.close(now).unwrap();
        let result = admit(
            &mut road,
            &[],
            request(Product::chemical("Acid", 100.0, 2).unwrap(), TransportMode::Sea, 1),
            &engine,
            now,
        );
        assert!(matches!(result, Err(ShipmentError::InvalidState(_))));
        assert!(road.package_ids.is_empty());
    }

    #[test]
    fn test_capacity_counts_units() {
        let engine = PricingEngine::default();
        let now = Utc::now();
        let mut air = shipment(TransportMode::Air, 50.0);
        let mut manifest = Vec::new();

        let first = admit(
            &mut air,
            &manifest,
            request(Product::fragile("Vase", 10.0).unwrap(), TransportMode::Air, 4),
            &engine,
            now,
        )
        .unwrap();
        manifest.push(first);

        let result = admit(
            &mut air,
            &manifest,
            request(Product::fragile("Vase", 10.0).unwrap(), TransportMode::Air, 2),
            &engine,
            now,
        );
        assert_eq!(
            result.unwrap_err(),
            ShipmentError::CapacityExceeded {
                requested: 20.0,
                available: 10.0
            }
        );
        assert_eq!(air.package_ids.len(), 1);
        assert_eq!(air.loaded_weight_kg, 40.0);
    }

    #[test]
    fn test_fragile_eligibility() {
        let engine = PricingEngine::default();
        let now = Utc::now();

        let mut sea = shipment(TransportMode::Sea, 100.0);
        let result = admit(
            &mut sea,
            &[],
            request(Product::fragile("Glass", 1.0).unwrap(), TransportMode::Sea, 1),
            &engine,
            now,
        );
        assert!(matches!(result, Err(ShipmentError::IneligibleProduct { .. })));

        for mode in [TransportMode::Road, TransportMode::Air] {
            let mut ship = shipment(mode, 100.0);
            assert!(admit(
                &mut ship,
                &[],
                request(Product::fragile("Glass", 1.0).unwrap(), mode, 1),
                &engine,
                now
            )
            .is_ok());
        }
    }

    #[test]
    fn test_invalid_requests() {
        let engine = PricingEngine::default();
        let now = Utc::now();
        let mut road = shipment(TransportMode::Road, 100.0);

        let mut bad = request(Product::perishable("Fish", 1.0).unwrap(), TransportMode::Road, 1);
        bad.product.weight_kg = 0.0;
        assert!(matches!(admit(&mut road, &[], bad, &engine, now), Err(ShipmentError::Validation(_))));

        let bad = request(Product::perishable("Fish", 1.0).unwrap(), TransportMode::Road, 0);
        assert!(matches!(admit(&mut road, &[], bad, &engine, now), Err(ShipmentError::Validation(_))));

        let mut bad = request(Product::perishable("Fish", 1.0).unwrap(), TransportMode::Road, 1);
        bad.sender.name = String::new();
        assert!(matches!(admit(&mut road, &[], bad, &engine, now), Err(ShipmentError::Validation(_))));
    }

    #[test]
    fn test_revenue_past_range_rejected() {
        let engine = PricingEngine::default();
        let now = Utc::now();
        let mut sea = shipment(TransportMode::Sea, 1e18);

        // Too large to price at all
        let result = admit(
            &mut sea,
            &[],
            request(Product::perishable("Fish", 1e17).unwrap(), TransportMode::Sea, 1),
            &engine,
            now,
        );
        assert!(matches!(result, Err(ShipmentError::Validation(_))));
        assert!(sea.package_ids.is_empty());
        assert_eq!(sea.total_revenue, 0);

        // Each package prices fine, the sum does not
        let first = admit(
            &mut sea,
            &[],
            request(Product::perishable("Fish", 6e14).unwrap(), TransportMode::Sea, 1),
            &engine,
            now,
        )
        .unwrap();
        let revenue = sea.total_revenue;
        assert_eq!(revenue, first.final_price + 5_000);
        let manifest = vec![first];

        let result = admit(
            &mut sea,
            &manifest,
            request(Product::perishable("Fish", 6e14).unwrap(), TransportMode::Sea, 1),
            &engine,
            now,
        );
        assert!(matches!(result, Err(ShipmentError::Validation(_))));
        assert_eq!(sea.package_ids, vec![manifest[0].id]);
        assert_eq!(sea.total_revenue, revenue);
        assert_eq!(sea.loaded_weight_kg, 6e14);
    }

    #[test]
    fn test_withdraw_recomputes_totals() {
        let engine = PricingEngine::default();
        let now = Utc::now();
        let mut sea = shipment(TransportMode::Sea, 1_000.0);
        let mut manifest = Vec::new();

        for product in [
            Product::perishable("Fish", 20.0).unwrap(),
            Product::chemical("Solvent", 10.0, 5).unwrap(),
        ] {
            let package = admit(&mut sea, &manifest, request(product, TransportMode::Sea, 1), &engine, now).unwrap();
            manifest.push(package);
        }
        assert_eq!(sea.total_revenue, 220_000);

        let solvent_id = manifest[1].id;
        withdraw(&mut sea, &mut manifest, solvent_id, &engine, now).unwrap();

        assert_eq!(manifest[1].state, PackageState::Cancelled);
        assert_eq!(sea.package_ids, vec![manifest[0].id]);
        assert_eq!(sea.surcharge_total, 5_000);
        assert_eq!(sea.total_revenue, 185_000);
        assert_eq!(sea.loaded_weight_kg, 20.0);

        // Already gone
        assert!(matches!(
            withdraw(&mut sea, &mut manifest, solvent_id, &engine, now),
            Err(ShipmentError::NotFound { .. })
        ));

        sea.close(now).unwrap();
        let fish_id = manifest[0].id;
        assert!(matches!(
            withdraw(&mut sea, &mut manifest, fish_id, &engine, now),
            Err(ShipmentError::InvalidState(_))
        ));
    }
}
