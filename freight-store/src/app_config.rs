use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use freight_catalog::pricing::{PricingConfig, DEFAULT_PRICE_FLOOR};
use freight_shipment::archive::DEFAULT_ARCHIVE_AFTER_DAYS;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Absent means the in-memory repository
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub geo: GeoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_price_floor")]
    pub price_floor: i64,
    #[serde(default = "default_archive_after_days")]
    pub archive_after_days: i64,
    #[serde(default = "default_sweep_interval")]
    pub archive_sweep_interval_seconds: u64,
}

fn default_price_floor() -> i64 { DEFAULT_PRICE_FLOOR }
fn default_archive_after_days() -> i64 { DEFAULT_ARCHIVE_AFTER_DAYS }
fn default_sweep_interval() -> u64 { 3600 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            price_floor: default_price_floor(),
            archive_after_days: default_archive_after_days(),
            archive_sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl BusinessRules {
    pub fn pricing(&self) -> PricingConfig {
        PricingConfig {
            price_floor: self.price_floor,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct PlaceCoordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Gazetteer of known places, keyed by name
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GeoConfig {
    #[serde(default)]
    pub places: HashMap<String, PlaceCoordinates>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `FREIGHT__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("FREIGHT").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse a TOML document on its own, without files or environment
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
