use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use freight_catalog::TransportMode;
use crate::models::{LifecycleState, Package, PackageState, ProgressState, Shipment};

/// Load and revenue figures for a single shipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentUtilization {
    pub shipment_id: Uuid,
    pub number: String,
    pub transport_mode: TransportMode,
    pub package_count: usize,
    pub loaded_weight_kg: f64,
    pub max_weight_kg: f64,
    pub utilization: f64,
    pub total_revenue: i64,
}

impl ShipmentUtilization {
    pub fn new(shipment: &Shipment) -> Self {
        Self {
            shipment_id: shipment.id,
            number: shipment.number.clone(),
            transport_mode: shipment.transport_mode,
            package_count: shipment.package_ids.len(),
            loaded_weight_kg: shipment.loaded_weight_kg,
            max_weight_kg: shipment.max_weight_kg,
            utilization: shipment.capacity().utilization(),
            total_revenue: shipment.total_revenue,
        }
    }
}

/// Operator dashboard figures
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipmentStatistics {
    pub shipment_count: usize,
    pub package_count: usize,
    pub shipments_by_progress: BTreeMap<ProgressState, usize>,
    pub shipments_by_lifecycle: BTreeMap<LifecycleState, usize>,
    pub shipments_by_mode: BTreeMap<TransportMode, usize>,
    pub packages_by_state: BTreeMap<PackageState, usize>,
    pub total_revenue: i64,
    pub revenue_by_mode: BTreeMap<TransportMode, i64>,
    pub shipments: Vec<ShipmentUtilization>,
}

impl ShipmentStatistics {
    pub fn compute(shipments: &[Shipment], packages: &[Package]) -> Self {
        let mut stats = Self {
            shipment_count: shipments.len(),
            package_count: packages.len(),
            ..Default::default()
        };

        for shipment in shipments {
            *stats.shipments_by_progress.entry(shipment.progress).or_default() += 1;
            *stats.shipments_by_lifecycle.entry(shipment.lifecycle).or_default() += 1;
            *stats.shipments_by_mode.entry(shipment.transport_mode).or_default() += 1;
            let by_mode = stats.revenue_by_mode.entry(shipment.transport_mode).or_default();
            *by_mode = by_mode.saturating_add(shipment.total_revenue);
            stats.total_revenue = stats.total_revenue.saturating_add(shipment.total_revenue);
            stats.shipments.push(ShipmentUtilization::new(shipment));
        }

        for package in packages {
            *stats.packages_by_state.entry(package.state).or_default() += 1;
        }

        stats.shipments.sort_by(|a, b| a.number.cmp(&b.number));
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{admit, AdmissionRequest};
    use crate::lifecycle::ShipmentDraft;
    use crate::models::{Contact, Place, Route};
    use chrono::Utc;
    use freight_catalog::{PricingEngine, Product};

    #[test]
    fn test_statistics() {
        let engine = PricingEngine::default();
        let now = Utc::now();
        let route = Route {
            origin: Place { name: "Dakar".to_string(), lat: 14.69, lon: -17.44 },
            destination: Place { name: "Praia".to_string(), lat: 14.93, lon: -23.51 },
        };

        let mut sea = Shipment::open(
            ShipmentDraft { route: route.clone(), distance_km: 100.0, max_weight_kg: 100.0, transport_mode: TransportMode::Sea },
            "SHP-000002".to_string(),
            now,
        )
        .unwrap();
        let air = Shipment::open(
            ShipmentDraft { route, distance_km: 650.0, max_weight_kg: 10.0, transport_mode: TransportMode::Air },
            "SHP-000001".to_string(),
            now,
        )
        .unwrap();

        let package = admit(
            &mut sea,
            &[],
            AdmissionRequest {
                sender: Contact::new("Awa", "+221770000001", "Dakar"),
                recipient: Contact::new("Nuno", "+2389000001", "Praia"),
                product: Product::perishable("Fish", 20.0).unwrap(),
                transport_mode: TransportMode::Sea,
                unit_count: 1,
            },
            &engine,
            now,
        )
        .unwrap();

        let stats = ShipmentStatistics::compute(&[sea, air], &[package]);

        assert_eq!(stats.shipment_count, 2);
        assert_eq!(stats.package_count, 1);
        assert_eq!(stats.total_revenue, 185_000);
        assert_eq!(stats.revenue_by_mode[&TransportMode::Sea], 185_000);
        assert_eq!(stats.shipments_by_progress[&ProgressState::Pending], 2);
        assert_eq!(stats.packages_by_state[&PackageState::Pending], 1);
        assert_eq!(stats.shipments[0].number, "SHP-000001");
        assert!((stats.shipments[1].utilization - 0.2).abs() < 1e-9);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["shipments_by_lifecycle"]["OPEN"], 2);
    }

    #[test]
    fn test_revenue_totals_saturate() {
        let now = Utc::now();
        let route = Route {
            origin: Place { name: "Dakar".to_string(), lat: 14.69, lon: -17.44 },
            destination: Place { name: "Praia".to_string(), lat: 14.93, lon: -23.51 },
        };
        let draft = ShipmentDraft { route, distance_km: 100.0, max_weight_kg: 100.0, transport_mode: TransportMode::Sea };

        let mut first = Shipment::open(draft.clone(), "SHP-000001".to_string(), now).unwrap();
        let mut second = Shipment::open(draft, "SHP-000002".to_string(), now).unwrap();
        first.total_revenue = i64::MAX - 10;
        second.total_revenue = 1_000;

        let stats = ShipmentStatistics::compute(&[first, second], &[]);
        assert_eq!(stats.total_revenue, i64::MAX);
        assert_eq!(stats.revenue_by_mode[&TransportMode::Sea], i64::MAX);
    }
}
