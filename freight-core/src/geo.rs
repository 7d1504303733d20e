use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Place lookup, used only when a shipment is created
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn resolve(&self, place: &str) -> Result<Coordinates, Box<dyn std::error::Error + Send + Sync>>;

    /// Distance in kilometres
    async fn distance(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(haversine_km(from, to))
    }
}

/// Great-circle distance
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
