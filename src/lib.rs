//! Pollenmap - pollen risk estimation over live weather data
//!
//! This library combines Open-Meteo weather lookups with Nominatim reverse
//! geocoding to estimate a heuristic pollen risk index for any coordinate,
//! with per-coordinate result caching and supersession of stale in-flight
//! lookups.

pub mod api;
pub mod config;
pub mod error;
pub mod geocode;
pub mod lookup;
pub mod models;
pub mod pollen;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::PollenMapConfig;
pub use error::{LookupError, PollenMapError};
pub use geocode::NominatimClient;
pub use lookup::{LookupService, ReverseGeocoder, WeatherProvider};
pub use models::{Coordinate, LocationInfo, LookupResult, WeatherSnapshot};
pub use pollen::{Recommendations, RiskTier, estimate, estimate_with};
pub use weather::OpenMeteoClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
