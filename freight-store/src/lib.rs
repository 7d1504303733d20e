pub mod app_config;
pub mod database;
pub mod pg_repo;
pub mod events;
pub mod gazetteer;

pub use app_config::Config;
pub use database::DbClient;
pub use pg_repo::PgShipmentRepository;
pub use events::{BroadcastNotifier, LogNotifier};
pub use gazetteer::GazetteerGeoResolver;
