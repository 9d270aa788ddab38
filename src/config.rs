//! Configuration management for `AQICast`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AqiCastError;
use crate::forecast::DEFAULT_HORIZON_DAYS;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `AQICast`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AqiCastConfig {
    /// Coordinate resolver configuration
    #[serde(default)]
    pub location: LocationConfig,
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Model artifact configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Historical data configuration
    #[serde(default)]
    pub history: HistoryConfig,
    /// Forecast settings
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Coordinate resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// IP geolocation endpoint (ip-api.com compatible)
    #[serde(default = "default_location_service_url")]
    pub service_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_location_timeout")]
    pub timeout_seconds: u32,
    /// Fixed latitude; when set together with `longitude` no lookup is made
    pub latitude: Option<f64>,
    /// Fixed longitude
    pub longitude: Option<f64>,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Transport-level retries for transient failures (0 disables retrying)
    #[serde(default)]
    pub max_retries: u32,
}

/// Model artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path of the serialized model
    #[serde(default = "default_model_path")]
    pub path: String,
}

/// Historical data settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// CSV file with `year`, `month`, `day`, `aqi` columns
    #[serde(default = "default_history_path")]
    pub path: String,
    /// Trailing window in days, ending at the latest observation
    #[serde(default = "default_history_window")]
    pub window_days: u32,
    /// Number of histogram bins
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: u32,
}

/// Forecast settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of future days to predict
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether weather responses are cached on disk
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP endpoint for trace export
    pub otlp_endpoint: Option<String>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

// Default value functions
fn default_location_service_url() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_location_timeout() -> u32 {
    10
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_model_path() -> String {
    "model_registry/random_forest_retrained.json".to_string()
}

fn default_history_path() -> String {
    "processed_data.csv".to_string()
}

fn default_history_window() -> u32 {
    30
}

fn default_histogram_bins() -> u32 {
    10
}

fn default_horizon_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u32 {
    1
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("aqicast").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".cache/aqicast".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_request_timeout() -> u32 {
    60
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            service_url: default_location_service_url(),
            timeout_seconds: default_location_timeout(),
            latitude: None,
            longitude: None,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            window_days: default_history_window(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl AqiCastConfig {
    /// Load configuration from the given file (or the default location) and
    /// environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

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

        // AQICAST_WEATHER__BASE_URL style overrides
        builder = builder.add_source(
            Environment::with_prefix("AQICAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AqiCastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aqicast").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.location.service_url.is_empty() {
            self.location.service_url = default_location_service_url();
        }
        if self.location.timeout_seconds == 0 {
            self.location.timeout_seconds = default_location_timeout();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.model.path.is_empty() {
            self.model.path = default_model_path();
        }
        if self.history.path.is_empty() {
            self.history.path = default_history_path();
        }
        if self.history.window_days == 0 {
            self.history.window_days = default_history_window();
        }
        if self.history.histogram_bins == 0 {
            self.history.histogram_bins = default_histogram_bins();
        }
        if self.forecast.horizon_days == 0 {
            self.forecast.horizon_days = default_horizon_days();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_fixed_location()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Fixed coordinates must be given as a pair and lie in range
    fn validate_fixed_location(&self) -> Result<()> {
        match (self.location.latitude, self.location.longitude) {
            (None, None) => Ok(()),
            (Some(lat), Some(lon)) => {
                crate::models::Coordinates::new(lat, lon)
                    .map_err(|e| AqiCastError::config(e.to_string()))?;
                Ok(())
            }
            _ => Err(AqiCastError::config(
                "location.latitude and location.longitude must be set together",
            )
            .into()),
        }
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.location.timeout_seconds > 120 {
            return Err(AqiCastError::config("Location lookup timeout cannot exceed 120 seconds").into());
        }

        if self.weather.timeout_seconds > 300 {
            return Err(AqiCastError::config("Weather API timeout cannot exceed 300 seconds").into());
        }

        if self.weather.max_retries > 10 {
            return Err(AqiCastError::config("Weather API max retries cannot exceed 10").into());
        }

        // Open-Meteo serves at most 16 forecast days and today is one of them
        if self.forecast.horizon_days > 15 {
            return Err(AqiCastError::config("Forecast horizon cannot exceed 15 days").into());
        }

        if self.history.window_days > 3660 {
            return Err(AqiCastError::config("History window cannot exceed 3660 days").into());
        }

        if self.history.histogram_bins > 100 {
            return Err(AqiCastError::config("Histogram bins cannot exceed 100").into());
        }

        if self.cache.ttl_hours > 168 {
            return Err(AqiCastError::config("Cache TTL cannot exceed 168 hours (1 week)").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AqiCastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AqiCastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Weather API base URL", &self.weather.base_url),
            ("Location service URL", &self.location.service_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AqiCastError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
