use async_trait::async_trait;
use std::collections::HashMap;
use freight_core::geo::{Coordinates, GeoResolver};
use crate::app_config::GeoConfig;

/// Resolves place names from a fixed table; distances are great-circle.
#[derive(Debug, Clone, Default)]
pub struct GazetteerGeoResolver {
    places: HashMap<String, Coordinates>,
}

impl GazetteerGeoResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GeoConfig) -> Self {
        config
            .places
            .iter()
            .fold(Self::new(), |resolver, (name, at)| resolver.with_place(name, at.lat, at.lon))
    }

    pub fn with_place(mut self, name: &str, lat: f64, lon: f64) -> Self {
        self.places.insert(Self::key(name), Coordinates { lat, lon });
        self
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

#[async_trait]
impl GeoResolver for GazetteerGeoResolver {
    async fn resolve(&self, place: &str) -> Result<Coordinates, Box<dyn std::error::Error + Send + Sync>> {
        self.places
            .get(&Self::key(place))
            .copied()
            .ok_or_else(|| format!("unknown place '{}'", place).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::PlaceCoordinates;

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let resolver = GazetteerGeoResolver::new().with_place("Saint-Louis", 16.03, -16.49);

        let at = resolver.resolve("  saint-louis ").await.unwrap();
        assert_eq!(at, Coordinates { lat: 16.03, lon: -16.49 });
        assert!(resolver.resolve("Thies").await.is_err());
    }

    #[tokio::test]
    async fn test_distance_from_config() {
        let mut config = GeoConfig::default();
        config.places.insert("dakar".to_string(), PlaceCoordinates { lat: 14.69, lon: -17.44 });
        config.places.insert("bamako".to_string(), PlaceCoordinates { lat: 12.64, lon: -8.0 });

        let resolver = GazetteerGeoResolver::from_config(&config);
        assert_eq!(resolver.len(), 2);

        let from = resolver.resolve("Dakar").await.unwrap();
        let to = resolver.resolve("Bamako").await.unwrap();
        let km = resolver.distance(from, to).await.unwrap();
        assert!((km - 1050.0).abs() < 30.0, "got {}", km);
    }
}
