//! Reverse geocoding and place search via Nominatim (OpenStreetMap)
//!
//! Free, no API key required. Nominatim's usage policy requires an
//! identifying User-Agent on every request.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::GeocoderConfig;
use crate::error::LookupError;
use crate::lookup::ReverseGeocoder;
use crate::models::{Coordinate, LocationInfo};

const USER_AGENT: &str = concat!("pollenmap/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the Nominatim reverse and search endpoints
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

/// One hit from the search endpoint. Nominatim serializes coordinates
/// as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl NominatimClient {
    /// Create a new client from the geocoder configuration
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(USER_AGENT)
            .build()
            .with_context(|| "Failed to create geocoding HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    /// Resolve a coordinate into address fields.
    ///
    /// The primary place name prefers city over town over village, matching
    /// what Nominatim returns for settlements of different sizes.
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn reverse(&self, coordinate: Coordinate) -> Result<LocationInfo, LookupError> {
        let url = format!(
            "{}/reverse?format=json&lat={}&lon={}&accept-language={}",
            self.base_url, coordinate.latitude, coordinate.longitude, self.language
        );

        debug!("Nominatim reverse request URL: {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| LookupError::failed(format!("Invalid Nominatim response: {e}")))?;

        let Some(address) = body.address else {
            return Ok(LocationInfo::default());
        };

        Ok(LocationInfo {
            city: address.city.or(address.town).or(address.village),
            state: address.state,
            country: address.country,
        })
    }

    /// Search for a place by free-form query, returning the best match.
    /// `None` means Nominatim found nothing for the query.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Option<Coordinate>, LookupError> {
        let url = format!(
            "{}/search?format=json&q={}&accept-language={}",
            self.base_url,
            urlencoding::encode(query),
            self.language
        );

        debug!("Nominatim search request URL: {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| LookupError::failed(format!("Invalid Nominatim response: {e}")))?;

        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };

        let latitude = hit
            .lat
            .parse::<f64>()
            .map_err(|e| LookupError::failed(format!("Bad latitude in search result: {e}")))?;
        let longitude = hit
            .lon
            .parse::<f64>()
            .map_err(|e| LookupError::failed(format!("Bad longitude in search result: {e}")))?;

        Ok(Some(Coordinate::new(latitude, longitude)))
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<LocationInfo, LookupError> {
        self.reverse(coordinate).await
    }
}
