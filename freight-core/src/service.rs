use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;
use freight_catalog::{PriceQuote, PricingEngine, Product, TransportMode};
use freight_shared::models::events::{NotificationKind, PackageNotification};
use freight_shipment::admission::{admit, withdraw};
use freight_shipment::codes::next_shipment_number;
use freight_shipment::{
    AdmissionRequest, ArchivePolicy, Client, Contact, Package, PackageFilter, PackageState, Place, Route,
    Shipment, ShipmentDraft, ShipmentError, ShipmentFilter, ShipmentStatistics, TrackingView,
};
use crate::geo::{Coordinates, GeoResolver};
use crate::locks::{ClientLocks, ShipmentLocks};
use crate::notifier::{build_notification, dispatch, NotificationWarning, Notifier};
use crate::repository::{RecordBatch, ShipmentRepository};
use crate::{CoreError, CoreResult};

/// A place as typed by the operator; coordinates are looked up when missing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceInput {
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl PlaceInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lat: None,
            lon: None,
        }
    }

    pub fn at(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat: Some(lat),
            lon: Some(lon),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShipmentRequest {
    pub origin: PlaceInput,
    pub destination: PlaceInput,
    pub max_weight_kg: f64,
    pub transport_mode: TransportMode,
}

/// Result of a mutation plus the notifications that could not be sent
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub result: T,
    pub warnings: Vec<NotificationWarning>,
}

/// A shipment transition and the packages it cascaded to
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentUpdate {
    pub shipment: Shipment,
    pub affected_packages: Vec<Package>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Admission {
    pub shipment: Shipment,
    pub package: Package,
}

/// A shipment with its packages
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub shipment: Shipment,
    pub packages: Vec<Package>,
}

/// Sole entry point for shipment and package mutations
pub struct ShipmentService {
    repo: Arc<dyn ShipmentRepository>,
    notifier: Arc<dyn Notifier>,
    geo: Arc<dyn GeoResolver>,
    pricing: PricingEngine,
    archive_policy: ArchivePolicy,
    locks: ShipmentLocks,
    client_locks: ClientLocks,
    numbering: Mutex<()>,
}

impl ShipmentService {
    pub fn new(
        repo: Arc<dyn ShipmentRepository>,
        notifier: Arc<dyn Notifier>,
        geo: Arc<dyn GeoResolver>,
        pricing: PricingEngine,
        archive_policy: ArchivePolicy,
    ) -> Self {
        Self {
            repo,
            notifier,
            geo,
            pricing,
            archive_policy,
            locks: ShipmentLocks::new(),
            client_locks: ClientLocks::new(),
            numbering: Mutex::new(()),
        }
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    // ------------------------------------------------------------------
    // Shipments
    // ------------------------------------------------------------------

    /// Create an empty OPEN/PENDING shipment
    pub async fn create_shipment(&self, req: CreateShipmentRequest) -> CoreResult<Shipment> {
        let origin = self.resolve_place(&req.origin).await?;
        let destination = self.resolve_place(&req.destination).await?;

        let distance_km = self
            .geo
            .distance(
                Coordinates { lat: origin.lat, lon: origin.lon },
                Coordinates { lat: destination.lat, lon: destination.lon },
            )
            .await
            .map_err(|e| CoreError::Geo(e.to_string()))?;

        let draft = ShipmentDraft {
            route: Route { origin, destination },
            distance_km,
            max_weight_kg: req.max_weight_kg,
            transport_mode: req.transport_mode,
        };
        draft.validate()?;

        let _numbering = self.numbering.lock().await;
        let existing = self
            .repo
            .query_shipments(&ShipmentFilter::default())
            .await
            .map_err(CoreError::persistence)?;
        let number = next_shipment_number(existing.iter().map(|s| s.number.as_str()));

        let shipment = Shipment::open(draft, number, Utc::now())?;
        self.commit(RecordBatch::new().shipment(shipment.clone())).await?;

        info!(
            "Shipment {} created: {} by {} ({:.1} km, {} kg)",
            shipment.number,
            shipment.route.describe(),
            shipment.transport_mode,
            shipment.distance_km,
            shipment.max_weight_kg
        );
        Ok(shipment)
    }

    /// OPEN → CLOSED
    pub async fn close(&self, shipment_id: Uuid) -> CoreResult<Shipment> {
        let _guard = self.locks.acquire(shipment_id).await;
        let mut shipment = self.require_shipment(shipment_id).await?;

        shipment.close(Utc::now())?;
        self.commit(RecordBatch::new().shipment(shipment.clone())).await?;

        info!("Shipment {} closed", shipment.number);
        Ok(shipment)
    }

    /// CLOSED → OPEN, only before departure
    pub async fn reopen(&self, shipment_id: Uuid) -> CoreResult<Shipment> {
        let _guard = self.locks.acquire(shipment_id).await;
        let mut shipment = self.require_shipment(shipment_id).await?;

        shipment.reopen(Utc::now())?;
        self.commit(RecordBatch::new().shipment(shipment.clone())).await?;

        info!("Shipment {} reopened", shipment.number);
        Ok(shipment)
    }

    /// PENDING → IN_TRANSIT; pending packages depart with it
    pub async fn start(&self, shipment_id: Uuid) -> CoreResult<Outcome<ShipmentUpdate>> {
        self.cascade(shipment_id, NotificationKind::Departed, |shipment, manifest, now| {
            shipment.start(manifest, now)
        })
        .await
    }

    /// IN_TRANSIT → ARRIVED; packages in transit arrive with it
    pub async fn mark_arrived(&self, shipment_id: Uuid) -> CoreResult<Outcome<ShipmentUpdate>> {
        self.cascade(shipment_id, NotificationKind::Arrived, |shipment, manifest, now| {
            shipment.mark_arrived(manifest, now)
        })
        .await
    }

    async fn cascade<F>(
        &self,
        shipment_id: Uuid,
        kind: NotificationKind,
        transition: F,
    ) -> CoreResult<Outcome<ShipmentUpdate>>
    where
        F: FnOnce(&mut Shipment, &mut [Package], DateTime<Utc>) -> Result<Vec<Uuid>, ShipmentError>,
    {
        let guard = self.locks.acquire(shipment_id).await;
        let mut shipment = self.require_shipment(shipment_id).await?;
        let mut manifest = self.load_manifest(&shipment).await?;

        let now = Utc::now();
        let affected_ids = transition(&mut shipment, manifest.as_mut_slice(), now)?;
        let affected: Vec<Package> = manifest
            .into_iter()
            .filter(|p| affected_ids.contains(&p.id))
            .collect();

        self.commit(RecordBatch::new().shipment(shipment.clone()).packages(affected.clone()))
            .await?;
        drop(guard);

        info!(
            "Shipment {} is now {} ({} packages moved)",
            shipment.number,
            shipment.progress,
            affected.len()
        );

        let notifications = affected
            .iter()
            .map(|p| build_notification(kind, p, &shipment, now))
            .collect();
        let warnings = self.notify(notifications).await;

        Ok(Outcome {
            result: ShipmentUpdate {
                shipment,
                affected_packages: affected,
            },
            warnings,
        })
    }

    // ------------------------------------------------------------------
    // Packages
    // ------------------------------------------------------------------

    /// Admit a package onto an open shipment
    pub async fn add_package(&self, shipment_id: Uuid, req: AdmissionRequest) -> CoreResult<Outcome<Admission>> {
        let guard = self.locks.acquire(shipment_id).await;
        let mut shipment = self.require_shipment(shipment_id).await?;
        let manifest = self.load_manifest(&shipment).await?;

        let now = Utc::now();
        let package = admit(&mut shipment, &manifest, req, &self.pricing, now)?;

        // Client records are shared across shipments
        let client_guards = self
            .client_locks
            .acquire_all([package.sender.phone().to_string(), package.recipient.phone().to_string()])
            .await;
        let clients = self.upsert_clients(&[&package.sender, &package.recipient], now).await?;

        self.commit(
            RecordBatch::new()
                .shipment(shipment.clone())
                .package(package.clone())
                .clients(clients),
        )
        .await?;
        drop(client_guards);
        drop(guard);

        info!(
            "Package {} admitted on {}: {} x{} ({} kg), price {}",
            package.id,
            shipment.number,
            package.product.kind(),
            package.unit_count,
            package.total_weight(),
            package.final_price
        );

        let warnings = self
            .notify(vec![build_notification(NotificationKind::Created, &package, &shipment, now)])
            .await;

        Ok(Outcome {
            result: Admission { shipment, package },
            warnings,
        })
    }

    /// PENDING → CANCELLED, removing the package from its open shipment
    pub async fn cancel_package(&self, package_id: Uuid) -> CoreResult<Admission> {
        let shipment_id = self.require_package(package_id).await?.shipment_id;
        let _guard = self.locks.acquire(shipment_id).await;

        let mut shipment = self.require_shipment(shipment_id).await?;
        let mut manifest = self.load_manifest(&shipment).await?;
        if !shipment.contains(&package_id) {
            // Already withdrawn, report against the stored package state
            let package = self.require_package(package_id).await?;
            return Err(ShipmentError::InvalidTransition {
                from: package.state,
                to: PackageState::Cancelled,
            }
            .into());
        }

        withdraw(&mut shipment, &mut manifest, package_id, &self.pricing, Utc::now())?;

        let package = manifest
            .into_iter()
            .find(|p| p.id == package_id)
            .ok_or_else(|| ShipmentError::package_not_found(package_id))?;

        self.commit(RecordBatch::new().shipment(shipment.clone()).package(package.clone()))
            .await?;

        info!("Package {} cancelled, removed from {}", package.id, shipment.number);
        Ok(Admission { shipment, package })
    }

    /// ARRIVED → RECOVERED, on presentation of the recipient code
    pub async fn mark_recovered(&self, package_id: Uuid, recipient_code: &str) -> CoreResult<Package> {
        let outcome = self
            .package_transition(package_id, None, |package, now| package.recover(recipient_code, now))
            .await?;
        Ok(outcome.result)
    }

    /// IN_TRANSIT or ARRIVED → LOST; the sender is told
    pub async fn mark_lost(&self, package_id: Uuid) -> CoreResult<Outcome<Package>> {
        self.package_transition(package_id, Some(NotificationKind::Lost), |package, now| {
            package.mark_lost(now)
        })
        .await
    }

    /// RECOVERED or LOST → ARCHIVED
    pub async fn archive_package(&self, package_id: Uuid) -> CoreResult<Package> {
        let outcome = self
            .package_transition(package_id, None, |package, now| package.archive(now))
            .await?;
        Ok(outcome.result)
    }

    async fn package_transition<F>(
        &self,
        package_id: Uuid,
        notify: Option<NotificationKind>,
        transition: F,
    ) -> CoreResult<Outcome<Package>>
    where
        F: FnOnce(&mut Package, DateTime<Utc>) -> Result<(), ShipmentError>,
    {
        let shipment_id = self.require_package(package_id).await?.shipment_id;
        let guard = self.locks.acquire(shipment_id).await;

        // Re-read under the lock
        let mut package = self.require_package(package_id).await?;
        let from = package.state;
        let now = Utc::now();
        transition(&mut package, now)?;

        // Everything the notice needs is read before the commit
        let notification = match notify {
            Some(kind) => {
                let shipment = self.require_shipment(shipment_id).await?;
                Some(build_notification(kind, &package, &shipment, now))
            }
            None => None,
        };

        self.commit(RecordBatch::new().package(package.clone())).await?;
        drop(guard);

        info!("Package {} moved {} -> {}", package.id, from, package.state);

        let warnings = match notification {
            Some(notification) => self.notify(vec![notification]).await,
            None => Vec::new(),
        };

        Ok(Outcome {
            result: package,
            warnings,
        })
    }

    /// Archive resolved packages whose window has elapsed. Each shipment's
    /// packages are committed as one batch. Returns the archived ids.
    pub async fn archive_expired(&self, now: DateTime<Utc>) -> CoreResult<Vec<Uuid>> {
        let mut by_shipment: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
        for state in [PackageState::Recovered, PackageState::Lost] {
            let filter = PackageFilter {
                state: Some(state),
                ..Default::default()
            };
            let resolved = self.repo.query_packages(&filter).await.map_err(CoreError::persistence)?;

            for package in resolved.into_iter().filter(|p| self.archive_policy.is_due(p, now)) {
                by_shipment.entry(package.shipment_id).or_default().push(package.id);
            }
        }

        let mut archived = Vec::new();
        for (shipment_id, package_ids) in by_shipment {
            let _guard = self.locks.acquire(shipment_id).await;

            let mut packages = self.repo.load_packages(&package_ids).await.map_err(CoreError::persistence)?;
            let swept = self.archive_policy.sweep(&mut packages, now);
            if swept.is_empty() {
                continue;
            }

            let changed: Vec<Package> = packages.into_iter().filter(|p| swept.contains(&p.id)).collect();
            self.commit(RecordBatch::new().packages(changed)).await?;

            debug!("Archived {} packages of shipment {}", swept.len(), shipment_id);
            archived.extend(swept);
        }

        if !archived.is_empty() {
            info!("Archive sweep moved {} packages to ARCHIVED", archived.len());
        }
        Ok(archived)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn get_shipment(&self, shipment_id: Uuid) -> CoreResult<Shipment> {
        self.require_shipment(shipment_id).await
    }

    pub async fn get_package(&self, package_id: Uuid) -> CoreResult<Package> {
        self.require_package(package_id).await
    }

    pub async fn manifest(&self, shipment_id: Uuid) -> CoreResult<Manifest> {
        let shipment = self.require_shipment(shipment_id).await?;
        let packages = self.load_manifest(&shipment).await?;
        Ok(Manifest { shipment, packages })
    }

    pub async fn search_shipments(&self, filter: &ShipmentFilter) -> CoreResult<Vec<Shipment>> {
        self.repo.query_shipments(filter).await.map_err(CoreError::persistence)
    }

    pub async fn search_packages(&self, filter: &PackageFilter) -> CoreResult<Vec<Package>> {
        self.repo.query_packages(filter).await.map_err(CoreError::persistence)
    }

    /// Public tracking by recipient code
    pub async fn track(&self, recipient_code: &str) -> CoreResult<TrackingView> {
        let package = self
            .repo
            .find_package_by_code(recipient_code.trim())
            .await
            .map_err(CoreError::persistence)?
            .ok_or_else(|| ShipmentError::package_not_found(recipient_code))?;
        let shipment = self.require_shipment(package.shipment_id).await?;
        Ok(TrackingView::new(&package, &shipment))
    }

    /// Price a prospective package without admitting it
    pub async fn quote(&self, shipment_id: Uuid, product: &Product, unit_count: u32) -> CoreResult<PriceQuote> {
        let shipment = self.require_shipment(shipment_id).await?;
        let quote = self
            .pricing
            .quote(product, shipment.transport_mode, shipment.distance_km, unit_count)
            .map_err(ShipmentError::from)?;
        Ok(quote)
    }

    pub async fn statistics(&self) -> CoreResult<ShipmentStatistics> {
        let shipments = self.search_shipments(&ShipmentFilter::default()).await?;
        let packages = self.search_packages(&PackageFilter::default()).await?;
        Ok(ShipmentStatistics::compute(&shipments, &packages))
    }

    pub async fn list_clients(&self) -> CoreResult<Vec<Client>> {
        self.repo.list_clients().await.map_err(CoreError::persistence)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn require_shipment(&self, id: Uuid) -> CoreResult<Shipment> {
        self.repo
            .load_shipment(id)
            .await
            .map_err(CoreError::persistence)?
            .ok_or_else(|| ShipmentError::shipment_not_found(id).into())
    }

    async fn require_package(&self, id: Uuid) -> CoreResult<Package> {
        self.repo
            .load_package(id)
            .await
            .map_err(CoreError::persistence)?
            .ok_or_else(|| ShipmentError::package_not_found(id).into())
    }

    async fn load_manifest(&self, shipment: &Shipment) -> CoreResult<Vec<Package>> {
        self.repo
            .load_packages(&shipment.package_ids)
            .await
            .map_err(CoreError::persistence)
    }

    async fn resolve_place(&self, input: &PlaceInput) -> CoreResult<Place> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ShipmentError::Validation("place name must not be empty".to_string()).into());
        }

        let coordinates = match (input.lat, input.lon) {
            (Some(lat), Some(lon)) => Coordinates { lat, lon },
            _ => self
                .geo
                .resolve(name)
                .await
                .map_err(|e| CoreError::Geo(format!("{}: {}", name, e)))?,
        };

        Ok(Place {
            name: name.to_string(),
            lat: coordinates.lat,
            lon: coordinates.lon,
        })
    }

    /// Client records for the given contacts, refreshed or new, one per phone
    async fn upsert_clients(&self, contacts: &[&Contact], now: DateTime<Utc>) -> CoreResult<Vec<Client>> {
        let mut clients: HashMap<String, Client> = HashMap::new();

        for contact in contacts {
            let phone = contact.phone().to_string();
            let existing = match clients.remove(&phone) {
                Some(client) => Some(client),
                None => self.repo.load_client(&phone).await.map_err(CoreError::persistence)?,
            };

            let client = match existing {
                Some(mut client) => {
                    client.merge(contact, now);
                    client
                }
                None => Client::from_contact(contact, now),
            };
            clients.insert(phone, client);
        }

        Ok(clients.into_values().collect())
    }

    async fn commit(&self, batch: RecordBatch) -> CoreResult<()> {
        let records = batch.len();
        self.repo.commit(batch).await.map_err(|e| {
            warn!("Commit of {} records failed: {}", records, e);
            CoreError::persistence(e)
        })
    }

    async fn notify(&self, notifications: Vec<PackageNotification>) -> Vec<NotificationWarning> {
        dispatch(self.notifier.as_ref(), notifications).await
    }
}
