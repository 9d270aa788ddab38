//! Data models for `AQICast`
//!
//! This module contains the core domain models organized by concern:
//! - Coordinates: validated user location
//! - Weather: daily covariates and the echoed conditions
//! - Forecast: weather forecast collections from a weather source
//! - Features: feature schema and the forecast feature table
//! - Prediction: per-day AQI predictions

pub mod coordinates;
pub mod features;
pub mod forecast;
pub mod prediction;
pub mod weather;

// Re-export all public types for convenient access
pub use coordinates::Coordinates;
pub use features::{FeatureSchema, ForecastFeatureRow, ForecastTable};
pub use forecast::WeatherForecast;
pub use prediction::PredictionRow;
pub use weather::{DailyConditions, DailyWeather};
