//! Data models for the pollenmap service
//!
//! Organized by concern:
//! - Location: coordinates, cache keys, and reverse-geocoded place info
//! - Weather: provider snapshots and the combined lookup result

pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{Coordinate, LocationInfo};
pub use weather::{CurrentConditions, HourlyForecast, LookupResult, WeatherSnapshot};
