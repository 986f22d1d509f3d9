//! Configuration management for `WeatherDeck`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherError;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `WeatherDeck` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Weather / geocoding provider configuration
    pub provider: ProviderConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
    /// History and favorites store configuration
    pub storage: StorageConfig,
    /// Forecast aggregation settings
    pub forecast: ForecastConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// OpenWeatherMap API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Base URL of the OpenWeatherMap API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u32,
    /// Number of geocoding candidates requested per search
    pub geocode_limit: u32,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for every non-API path
    pub static_dir: String,
}

/// History / favorites store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database directory
    pub path: String,
    /// Oldest search history entries beyond this count are discarded
    pub max_history_entries: u32,
}

/// Forecast aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// IANA time zone used to derive forecast day labels
    pub timezone: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_provider_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_provider_timeout() -> u32 {
    10
}

fn default_geocode_limit() -> u32 {
    5
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_storage_path() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("weatherdeck"))
        .unwrap_or_else(|| PathBuf::from("data"))
        .to_string_lossy()
        .into_owned()
}

fn default_max_history_entries() -> u32 {
    500
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_provider_base_url(),
            timeout_seconds: default_provider_timeout(),
            geocode_limit: default_geocode_limit(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            max_history_entries: default_max_history_entries(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl ForecastConfig {
    /// Parsed forecast time zone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            WeatherError::config(format!(
                "Invalid forecast time zone '{}'. Use an IANA name such as UTC or Europe/London",
                self.timezone
            ))
            .into()
        })
    }
}

impl AppConfig {
    /// Load configuration from the given file (or the default location) and
    /// environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. WEATHERDECK_PROVIDER__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("WEATHERDECK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("OPENWEATHER_API_KEY").ok();
        }

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherdeck").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.provider.base_url.is_empty() {
            self.provider.base_url = default_provider_base_url();
        }
        if self.provider.timeout_seconds == 0 {
            self.provider.timeout_seconds = default_provider_timeout();
        }
        if self.provider.geocode_limit == 0 {
            self.provider.geocode_limit = default_geocode_limit();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.static_dir.is_empty() {
            self.server.static_dir = default_static_dir();
        }
        if self.storage.path.is_empty() {
            self.storage.path = default_storage_path();
        }
        if self.storage.max_history_entries == 0 {
            self.storage.max_history_entries = default_max_history_entries();
        }
        if self.forecast.timezone.is_empty() {
            self.forecast.timezone = default_timezone();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // The key may be absent here; commands that call the provider require it
        if let Some(api_key) = &self.provider.api_key {
            if api_key.is_empty() {
                return Err(WeatherError::config(
                    "OpenWeatherMap API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(WeatherError::config(
                    "OpenWeatherMap API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 100 {
                return Err(WeatherError::config(
                    "OpenWeatherMap API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.provider.timeout_seconds == 0 || self.provider.timeout_seconds > 300 {
            return Err(WeatherError::config(
                "Provider timeout must be between 1 and 300 seconds"
            ).into());
        }

        if !(1..=5).contains(&self.provider.geocode_limit) {
            return Err(WeatherError::config(
                "Geocode limit must be between 1 and 5"
            ).into());
        }

        if self.storage.max_history_entries > 100_000 {
            return Err(WeatherError::config(
                "Search history cannot keep more than 100000 entries"
            ).into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        if !self.provider.base_url.starts_with("http://") && !self.provider.base_url.starts_with("https://") {
            return Err(WeatherError::config(
                "Provider base URL must be a valid HTTP or HTTPS URL"
            ).into());
        }

        self.forecast.tz()?;

        Ok(())
    }
}
