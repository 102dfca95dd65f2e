//! Configuration management for the pollenmap service
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and validates all settings before the service starts.

use crate::PollenMapError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the pollenmap service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PollenMapConfig {
    /// Weather provider configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Reverse geocoder configuration
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    /// Lookup cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the Open-Meteo forecast API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u32,
}

/// Reverse geocoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Base URL for the Nominatim API
    #[serde(default = "default_geocoder_base_url")]
    pub base_url: String,
    /// Preferred language for place names (accept-language)
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u32,
}

/// Lookup cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Minutes after which a cached lookup is considered stale
    #[serde(default = "default_expiry_minutes")]
    pub expiry_minutes: u32,
    /// Seconds between background sweeps of expired entries
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u32,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port for the web API
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served as the static frontend
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_geocoder_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_request_timeout() -> u32 {
    30
}

fn default_expiry_minutes() -> u32 {
    10
}

fn default_sweep_interval() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "frontend/dist".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_base_url(),
            language: default_language(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiry_minutes: default_expiry_minutes(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl CacheConfig {
    /// Expiry window as a duration
    #[must_use]
    pub fn expiry_window(&self) -> Duration {
        Duration::from_secs(u64::from(self.expiry_minutes) * 60)
    }

    /// Sweep interval as a duration
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.sweep_interval_seconds))
    }
}

impl PollenMapConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from the given path, falling back to the default
    /// location, with `POLLENMAP_` environment variable overrides
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("POLLENMAP")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: PollenMapConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Default configuration file path
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pollenmap").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("Weather", &self.weather.base_url),
            ("Geocoder", &self.geocoder.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PollenMapError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 300 {
            return Err(
                PollenMapError::config("Weather timeout must be between 1 and 300 seconds").into(),
            );
        }

        if self.geocoder.timeout_seconds == 0 || self.geocoder.timeout_seconds > 300 {
            return Err(
                PollenMapError::config("Geocoder timeout must be between 1 and 300 seconds").into(),
            );
        }

        if self.cache.expiry_minutes == 0 {
            return Err(PollenMapError::config("Cache expiry cannot be zero").into());
        }

        if self.cache.sweep_interval_seconds == 0 {
            return Err(PollenMapError::config("Sweep interval cannot be zero").into());
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PollenMapError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollenMapConfig::default();
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com/v1");
        assert_eq!(
            config.geocoder.base_url,
            "https://nominatim.openstreetmap.org"
        );
        assert_eq!(config.cache.expiry_minutes, 10);
        assert_eq!(config.cache.sweep_interval_seconds, 60);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_expiry_window_duration() {
        let config = PollenMapConfig::default();
        assert_eq!(config.cache.expiry_window(), Duration::from_secs(600));
        assert_eq!(config.cache.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let mut config = PollenMapConfig::default();
        config.weather.base_url = "ftp://example.com".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("valid HTTP or HTTPS URL")
        );
    }

    #[test]
    fn test_validation_rejects_zero_expiry() {
        let mut config = PollenMapConfig::default();
        config.cache.expiry_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_log_level() {
        let mut config = PollenMapConfig::default();
        config.logging.level = "verbose".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid log level")
        );
    }
}
