use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use freight_shipment::{Client, Package, PackageFilter, Shipment, ShipmentFilter};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Writes that must land together or not at all
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    pub shipments: Vec<Shipment>,
    pub packages: Vec<Package>,
    pub clients: Vec<Client>,
}

impl RecordBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shipment(mut self, shipment: Shipment) -> Self {
        self.shipments.push(shipment);
        self
    }

    pub fn package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    pub fn packages<I: IntoIterator<Item = Package>>(mut self, packages: I) -> Self {
        self.packages.extend(packages);
        self
    }

    pub fn clients<I: IntoIterator<Item = Client>>(mut self, clients: I) -> Self {
        self.clients.extend(clients);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty() && self.packages.is_empty() && self.clients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shipments.len() + self.packages.len() + self.clients.len()
    }
}

/// Durable store for shipments, packages and clients
#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    async fn load_shipment(&self, id: Uuid) -> RepoResult<Option<Shipment>>;

    async fn load_package(&self, id: Uuid) -> RepoResult<Option<Package>>;

    /// Packages with the given ids; unknown ids are skipped.
    async fn load_packages(&self, ids: &[Uuid]) -> RepoResult<Vec<Package>>;

    async fn find_package_by_code(&self, recipient_code: &str) -> RepoResult<Option<Package>>;

    async fn load_client(&self, phone: &str) -> RepoResult<Option<Client>>;

    async fn query_shipments(&self, filter: &ShipmentFilter) -> RepoResult<Vec<Shipment>>;

    async fn query_packages(&self, filter: &PackageFilter) -> RepoResult<Vec<Package>>;

    async fn list_clients(&self) -> RepoResult<Vec<Client>>;

    /// Persist every record of the batch atomically.
    async fn commit(&self, batch: RecordBatch) -> RepoResult<()>;
}

#[derive(Default)]
struct Tables {
    shipments: HashMap<Uuid, Shipment>,
    packages: HashMap<Uuid, Package>,
    clients: HashMap<String, Client>,
}

/// Process-local repository. A batch is applied under a single write lock,
/// so readers never observe half of it.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShipmentRepository for InMemoryRepository {
    async fn load_shipment(&self, id: Uuid) -> RepoResult<Option<Shipment>> {
        Ok(self.tables.read().await.shipments.get(&id).cloned())
    }

    async fn load_package(&self, id: Uuid) -> RepoResult<Option<Package>> {
        Ok(self.tables.read().await.packages.get(&id).cloned())
    }

    async fn load_packages(&self, ids: &[Uuid]) -> RepoResult<Vec<Package>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.packages.get(id).cloned()).collect())
    }

    async fn find_package_by_code(&self, recipient_code: &str) -> RepoResult<Option<Package>> {
        let tables = self.tables.read().await;
        Ok(tables
            .packages
            .values()
            .find(|p| p.recipient_code.eq_ignore_ascii_case(recipient_code))
            .cloned())
    }

    async fn load_client(&self, phone: &str) -> RepoResult<Option<Client>> {
        Ok(self.tables.read().await.clients.get(phone).cloned())
    }

    async fn query_shipments(&self, filter: &ShipmentFilter) -> RepoResult<Vec<Shipment>> {
        let tables = self.tables.read().await;
        let mut shipments: Vec<Shipment> = tables
            .shipments
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        shipments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.number.cmp(&b.number)));
        Ok(shipments)
    }

    async fn query_packages(&self, filter: &PackageFilter) -> RepoResult<Vec<Package>> {
        let tables = self.tables.read().await;
        let mut packages: Vec<Package> = tables
            .packages
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        packages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(packages)
    }

    async fn list_clients(&self) -> RepoResult<Vec<Client>> {
        let tables = self.tables.read().await;
        let mut clients: Vec<Client> = tables.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }

    async fn commit(&self, batch: RecordBatch) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        for shipment in batch.shipments {
            tables.shipments.insert(shipment.id, shipment);
        }
        for package in batch.packages {
            tables.packages.insert(package.id, package);
        }
        for client in batch.clients {
            tables.clients.insert(client.phone().to_string(), client);
        }
        Ok(())
    }
}
