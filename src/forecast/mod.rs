//! AQI forecast pipeline
//!
//! - Feature construction from weather forecasts and calendar data
//! - Model artifact loading and the process-wide shared model
//! - Row-by-row prediction
//! - The render pipeline tying the stages together

pub mod feature_builder;
pub mod model;
pub mod pipeline;
pub mod predictor;

/// Number of future days predicted by default
pub const DEFAULT_HORIZON_DAYS: u32 = 3;

pub use feature_builder::{Feature, FeatureBuilder};
pub use model::{Estimator, Model, RegressionTree, load_model, shared_model};
pub use pipeline::{DashboardForecast, ForecastPipeline};
pub use predictor::predict;
