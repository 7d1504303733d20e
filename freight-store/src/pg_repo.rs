use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;
use freight_core::repository::{RecordBatch, RepoResult, ShipmentRepository};
use freight_shipment::{Client, Package, PackageFilter, Shipment, ShipmentFilter};

/// Postgres store. Each aggregate is kept whole as a JSONB record next to the
/// columns needed for lookups.
pub struct PgShipmentRepository {
    pool: PgPool,
}

impl PgShipmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    record: Value,
}

fn decode<T: DeserializeOwned>(row: RecordRow) -> RepoResult<T> {
    Ok(serde_json::from_value(row.record)?)
}

fn decode_all<T: DeserializeOwned>(rows: Vec<RecordRow>) -> RepoResult<Vec<T>> {
    rows.into_iter().map(decode).collect()
}

#[async_trait]
impl ShipmentRepository for PgShipmentRepository {
    async fn load_shipment(&self, id: Uuid) -> RepoResult<Option<Shipment>> {
        let row = sqlx::query_as::<_, RecordRow>("SELECT record FROM shipments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(decode).transpose()
    }

    async fn load_package(&self, id: Uuid) -> RepoResult<Option<Package>> {
        let row = sqlx::query_as::<_, RecordRow>("SELECT record FROM packages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(decode).transpose()
    }

    async fn load_packages(&self, ids: &[Uuid]) -> RepoResult<Vec<Package>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RecordRow>("SELECT record FROM packages WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        // Manifest order
        let mut by_id: HashMap<Uuid, Package> = decode_all::<Package>(rows)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn find_package_by_code(&self, recipient_code: &str) -> RepoResult<Option<Package>> {
        let row = sqlx::query_as::<_, RecordRow>("SELECT record FROM packages WHERE recipient_code = UPPER($1)")
            .bind(recipient_code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(decode).transpose()
    }

    async fn load_client(&self, phone: &str) -> RepoResult<Option<Client>> {
        let row = sqlx::query_as::<_, RecordRow>("SELECT record FROM clients WHERE phone = $1")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;
        row.map(decode).transpose()
    }

    async fn query_shipments(&self, filter: &ShipmentFilter) -> RepoResult<Vec<Shipment>> {
        let rows = sqlx::query_as::<_, RecordRow>("SELECT record FROM shipments ORDER BY created_at, number")
            .fetch_all(&self.pool)
            .await?;

        let shipments: Vec<Shipment> = decode_all(rows)?;
        Ok(shipments.into_iter().filter(|s| filter.matches(s)).collect())
    }

    async fn query_packages(&self, filter: &PackageFilter) -> RepoResult<Vec<Package>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT record FROM packages
            WHERE ($1::text IS NULL OR state = $1)
              AND ($2::uuid IS NULL OR shipment_id = $2)
            ORDER BY created_at, id
            "#,
        )
        .bind(filter.state.map(|s| s.as_str()))
        .bind(filter.shipment_id)
        .fetch_all(&self.pool)
        .await?;

        let packages: Vec<Package> = decode_all(rows)?;
        Ok(packages.into_iter().filter(|p| filter.matches(p)).collect())
    }

    async fn list_clients(&self) -> RepoResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, RecordRow>("SELECT record FROM clients ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        decode_all(rows)
    }

    async fn commit(&self, batch: RecordBatch) -> RepoResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for shipment in &batch.shipments {
            sqlx::query(
                r#"
                INSERT INTO shipments (id, number, record, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE SET record = EXCLUDED.record, updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(shipment.id)
            .bind(&shipment.number)
            .bind(serde_json::to_value(shipment)?)
            .bind(shipment.created_at)
            .bind(shipment.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        for package in &batch.packages {
            sqlx::query(
                r#"
                INSERT INTO packages (id, shipment_id, recipient_code, state, record, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id) DO UPDATE
                SET state = EXCLUDED.state, record = EXCLUDED.record, updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(package.id)
            .bind(package.shipment_id)
            .bind(&package.recipient_code)
            .bind(package.state.as_str())
            .bind(serde_json::to_value(package)?)
            .bind(package.created_at)
            .bind(package.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        for client in &batch.clients {
            sqlx::query(
                r#"
                INSERT INTO clients (phone, name, record, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (phone) DO UPDATE
                SET name = EXCLUDED.name, record = EXCLUDED.record, updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(client.phone())
            .bind(&client.name)
            .bind(serde_json::to_value(client)?)
            .bind(client.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
