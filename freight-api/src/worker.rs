use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{error, info};
use freight_core::ShipmentService;

/// Periodically archive resolved packages whose window has elapsed.
pub fn start_archive_worker(service: Arc<ShipmentService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Archive worker started, sweeping every {}s", every.as_secs());
        let mut interval = tokio::time::interval(every);

        loop {
            interval.tick().await;
            run_sweep(&service).await;
        }
    })
}

async fn run_sweep(service: &ShipmentService) {
    match service.archive_expired(Utc::now()).await {
        Ok(archived) if archived.is_empty() => {}
        Ok(archived) => info!("Archive sweep: {} packages archived", archived.len()),
        Err(e) => error!("Archive sweep failed: {}", e),
    }
}
