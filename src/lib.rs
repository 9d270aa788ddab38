//! `AQICast` - Short-horizon air quality forecasting
//!
//! This library resolves the user's location, turns a weather forecast into
//! model features and predicts the air quality index for the next days with
//! a pre-trained regression model.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod forecast;
pub mod history;
pub mod http;
pub mod location_resolver;
pub mod models;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::AqiCastConfig;
pub use error::AqiCastError;
pub use forecast::{
    DEFAULT_HORIZON_DAYS, DashboardForecast, FeatureBuilder, ForecastPipeline, Model, load_model,
    predict,
};
pub use history::AqiHistory;
pub use location_resolver::{CoordinateResolver, FixedResolver, IpGeolocationResolver};
pub use models::{Coordinates, FeatureSchema, ForecastTable, PredictionRow, WeatherForecast};
pub use weather::{OpenMeteoClient, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AqiCastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
