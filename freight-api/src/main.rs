use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::Duration;
use freight_api::{app, worker, AppState};
use freight_catalog::{PricingEngine, TariffTable};
use freight_core::{InMemoryRepository, ShipmentRepository, ShipmentService};
use freight_shipment::ArchivePolicy;
use freight_store::{BroadcastNotifier, Config, DbClient, GazetteerGeoResolver, LogNotifier, PgShipmentRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const NOTIFICATION_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freight_api=debug,freight_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Freight API on port {}", config.server.port);

    let repo: Arc<dyn ShipmentRepository> = match &config.database {
        Some(database) => {
            let db = DbClient::new(&database.url, database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Arc::new(PgShipmentRepository::new(db.pool.clone()))
        }
        None => {
            tracing::warn!("No database configured, records live in memory only");
            Arc::new(InMemoryRepository::new())
        }
    };

    let geo = GazetteerGeoResolver::from_config(&config.geo);
    tracing::info!("Gazetteer loaded with {} places", geo.len());

    // Gateways subscribe to the broadcast; the log is always one of them
    let notifier = BroadcastNotifier::new(NOTIFICATION_BUFFER);
    notifier.spawn_forwarder(Arc::new(LogNotifier));

    let rules = config.business_rules.clone();
    let service = Arc::new(ShipmentService::new(
        repo,
        Arc::new(notifier),
        Arc::new(geo),
        PricingEngine::new(TariffTable::standard(), rules.pricing()),
        ArchivePolicy::new(rules.archive_after_days),
    ));

    worker::start_archive_worker(
        service.clone(),
        Duration::from_secs(rules.archive_sweep_interval_seconds.max(1)),
    );

    let app = app(AppState::new(service, rules));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
