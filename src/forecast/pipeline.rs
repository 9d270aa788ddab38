//! One dashboard render: resolve coordinates, build features, predict.
//!
//! Every stage either completes or aborts the render; later stages never run
//! after a failure and no partial forecast is returned.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use super::feature_builder::FeatureBuilder;
use super::model::{Model, shared_model};
use super::predictor::predict;
use crate::AqiCastError;
use crate::config::AqiCastConfig;
use crate::location_resolver::{CoordinateResolver, resolver_from_config};
use crate::models::{Coordinates, PredictionRow};
use crate::weather::{OpenMeteoClient, WeatherSource};

/// Result of a successful render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardForecast {
    pub coordinates: Coordinates,
    pub issued_on: NaiveDate,
    pub model: String,
    pub predictions: Vec<PredictionRow>,
    pub generated_at: DateTime<Utc>,
}

pub struct ForecastPipeline {
    resolver: Arc<dyn CoordinateResolver>,
    builder: FeatureBuilder,
    model: Arc<Model>,
    horizon_days: u32,
}

impl ForecastPipeline {
    /// Wire the stages together; the builder adopts the model's schema
    pub fn new(
        resolver: Arc<dyn CoordinateResolver>,
        weather: Arc<dyn WeatherSource>,
        model: Arc<Model>,
        horizon_days: u32,
    ) -> Result<Self, AqiCastError> {
        let builder = FeatureBuilder::new(weather, model.feature_schema().clone())?;
        Ok(Self {
            resolver,
            builder,
            model,
            horizon_days,
        })
    }

    /// Production wiring. The model is loaded first, so a bad artifact fails
    /// here before any network call.
    pub async fn from_config(config: &AqiCastConfig) -> Result<Self, AqiCastError> {
        let model = shared_model(Path::new(&config.model.path)).await?;

        let resolver: Arc<dyn CoordinateResolver> = resolver_from_config(config)
            .map_err(|e| AqiCastError::config(format!("{e:#}")))?
            .into();
        let weather = OpenMeteoClient::new(config)
            .map_err(|e| AqiCastError::config(format!("{e:#}")))?;

        Self::new(
            resolver,
            Arc::new(weather),
            model,
            config.forecast.horizon_days,
        )
    }

    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[must_use]
    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// Full render for the current user, dated by the local wall clock
    pub async fn run(&self) -> Result<DashboardForecast, AqiCastError> {
        self.run_on(Local::now().date_naive()).await
    }

    /// Full render with an explicit "today"
    pub async fn run_on(&self, today: NaiveDate) -> Result<DashboardForecast, AqiCastError> {
        let coordinates = self.resolver.resolve_coordinates().await?;
        info!("Location fetched: {}", coordinates);
        self.run_for(coordinates, today).await
    }

    /// Render for known coordinates, skipping the resolver
    #[instrument(skip(self), fields(model = %self.model.name))]
    pub async fn run_for(
        &self,
        coordinates: Coordinates,
        today: NaiveDate,
    ) -> Result<DashboardForecast, AqiCastError> {
        let table = self
            .builder
            .build_forecast_features(coordinates, today, self.horizon_days)
            .await?;
        let predictions = predict(&self.model, &table)?;

        info!("Predicted AQI for {} days", predictions.len());
        Ok(DashboardForecast {
            coordinates,
            issued_on: today,
            model: self.model.name.clone(),
            predictions,
            generated_at: Utc::now(),
        })
    }
}
