//! Weather models: current conditions and hourly forecast as delivered by
//! the upstream provider, plus the combined lookup result

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Coordinate, LocationInfo};

/// Current weather conditions for a point
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Air temperature in Celsius
    pub temperature: f64,
    /// Apparent ("feels like") temperature in Celsius
    pub apparent_temperature: f64,
    /// Relative humidity in percent (0-100)
    pub relative_humidity: f64,
    /// WMO weather interpretation code
    pub weather_code: u8,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// UV index
    pub uv_index: f64,
}

/// Hourly forecast series, parallel vectors indexed by hour
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct HourlyForecast {
    /// Forecast timestamps (local to the queried point)
    pub time: Vec<NaiveDateTime>,
    /// Temperature in Celsius per hour
    pub temperature: Vec<f64>,
    /// Precipitation probability in percent per hour
    pub precipitation_probability: Vec<u8>,
}

/// Weather data for a point, passed through from the provider unmodified
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub hourly: HourlyForecast,
    /// IANA timezone name of the queried point
    pub timezone: String,
    /// Timezone abbreviation (e.g. "BRT")
    pub timezone_abbreviation: String,
}

/// Combined outcome of a successful lookup, immutable once constructed
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LookupResult {
    pub weather: WeatherSnapshot,
    pub location: LocationInfo,
    pub coordinate: Coordinate,
}
