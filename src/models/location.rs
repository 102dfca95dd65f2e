//! Location models: geographic coordinates and reverse-geocoded place info

use serde::{Deserialize, Serialize};

/// A geographic point in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Round both axes to 4 decimal places, half away from zero.
    #[must_use]
    pub fn rounded(&self) -> (f64, f64) {
        const MULTIPLIER: f64 = 10_000.0;
        (
            (self.latitude * MULTIPLIER).round() / MULTIPLIER,
            (self.longitude * MULTIPLIER).round() / MULTIPLIER,
        )
    }

    /// Composite cache key: each axis rounded to 4 decimal places independently.
    ///
    /// Nearby points (within ~11m) collapse onto the same key, so repeated
    /// lookups around the same spot share one cache entry.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let (lat, lon) = self.rounded();
        format!("{lat:.4},{lon:.4}")
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Address information resolved via reverse geocoding
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct LocationInfo {
    /// Primary place name (city, falling back to town, then village)
    pub city: Option<String>,
    /// State or region
    pub state: Option<String>,
    /// Country name
    pub country: Option<String>,
}

impl LocationInfo {
    /// Human-readable place name with a generic fallback when the
    /// geocoder returned nothing usable.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.city
            .as_deref()
            .or(self.state.as_deref())
            .or(self.country.as_deref())
            .unwrap_or("Location")
            .to_string()
    }
}
