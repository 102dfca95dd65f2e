//! Weather client for the Open-Meteo forecast API
//!
//! Fetches current conditions plus the hourly temperature and precipitation
//! probability series for a coordinate. Open-Meteo requires no API key. The
//! client performs no retries; a failed call is reported to the caller as a
//! lookup failure.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::WeatherConfig;
use crate::error::LookupError;
use crate::lookup::WeatherProvider;
use crate::models::{Coordinate, WeatherSnapshot};

const USER_AGENT: &str = concat!("pollenmap/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the Open-Meteo forecast endpoint
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    /// Create a new client from the weather configuration
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(USER_AGENT)
            .build()
            .with_context(|| "Failed to create weather HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch current conditions and the hourly series for a coordinate
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn current_conditions(
        &self,
        coordinate: Coordinate,
    ) -> Result<WeatherSnapshot, LookupError> {
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&current=temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m,uv_index&hourly=temperature_2m,precipitation_probability&timezone=auto",
            self.base_url, coordinate.latitude, coordinate.longitude
        );

        debug!("Open-Meteo request URL: {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;

        let forecast: openmeteo::ForecastResponse = response
            .json()
            .await
            .map_err(|e| LookupError::failed(format!("Invalid Open-Meteo response: {e}")))?;

        WeatherSnapshot::try_from(forecast)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn fetch_weather(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, LookupError> {
        self.current_conditions(coordinate).await
    }
}

/// Convert a WMO weather interpretation code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 | 2 => "Partly cloudy",
        3 => "Cloudy",
        45 => "Fog",
        61 => "Light rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        95 => "Thunderstorm",
        _ => "Unknown",
    }
}

/// `Open-Meteo` API response structures and conversion into crate models
mod openmeteo {
    use chrono::{NaiveDateTime, Utc};
    use serde::Deserialize;

    use crate::error::LookupError;
    use crate::models::{CurrentConditions, HourlyForecast, WeatherSnapshot};

    /// Forecast response from `Open-Meteo`
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub timezone: String,
        pub timezone_abbreviation: String,
        pub current: Option<CurrentData>,
        pub hourly: Option<HourlyData>,
    }

    /// Current conditions block
    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        #[serde(rename = "temperature_2m")]
        pub temperature: f64,
        #[serde(rename = "relative_humidity_2m")]
        pub relative_humidity: f64,
        pub apparent_temperature: f64,
        pub weather_code: u8,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: f64,
        pub uv_index: f64,
    }

    /// Hourly series block
    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<Vec<f64>>,
        pub precipitation_probability: Option<Vec<u8>>,
    }

    impl TryFrom<ForecastResponse> for WeatherSnapshot {
        type Error = LookupError;

        fn try_from(response: ForecastResponse) -> Result<Self, Self::Error> {
            let current = response.current.ok_or_else(|| {
                LookupError::failed("No current weather data in Open-Meteo response")
            })?;

            let hourly = response.hourly.map(HourlyForecast::from).unwrap_or_default();

            Ok(WeatherSnapshot {
                current: CurrentConditions {
                    temperature: current.temperature,
                    apparent_temperature: current.apparent_temperature,
                    relative_humidity: current.relative_humidity,
                    weather_code: current.weather_code,
                    wind_speed: current.wind_speed,
                    uv_index: current.uv_index,
                },
                hourly,
                timezone: response.timezone,
                timezone_abbreviation: response.timezone_abbreviation,
            })
        }
    }

    impl From<HourlyData> for HourlyForecast {
        fn from(hourly: HourlyData) -> Self {
            let time = hourly
                .time
                .iter()
                .map(|t| {
                    NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M")
                        .unwrap_or_else(|_| Utc::now().naive_utc())
                })
                .collect();

            Self {
                time,
                temperature: hourly.temperature.unwrap_or_default(),
                precipitation_probability: hourly.precipitation_probability.unwrap_or_default(),
            }
        }
    }
}
