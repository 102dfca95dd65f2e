use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use pollenmap::api::ApiState;
use pollenmap::config::PollenMapConfig;
use pollenmap::geocode::NominatimClient;
use pollenmap::lookup::{LookupService, ReverseGeocoder};
use pollenmap::weather::OpenMeteoClient;
use pollenmap::web;

#[tokio::main]
async fn main() -> Result<()> {
    let config = PollenMapConfig::load().with_context(|| "Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    let weather = Arc::new(OpenMeteoClient::new(&config.weather)?);
    let geocoder = Arc::new(NominatimClient::new(&config.geocoder)?);
    let lookup = Arc::new(LookupService::new(
        weather,
        Arc::clone(&geocoder) as Arc<dyn ReverseGeocoder>,
        &config.cache,
    ));

    // Evicts expired cache entries for the lifetime of the process
    let _sweeper = lookup.spawn_sweeper();

    let state = ApiState { lookup, geocoder };
    web::run(config.server.port, &config.server.static_dir, state).await
}
