//! JSON API consumed by the dashboard front end

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    AqiCastError,
    config::HistoryConfig,
    forecast::{DashboardForecast, ForecastPipeline},
    history::{AqiHistory, load_history},
    models::Coordinates,
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ForecastPipeline>,
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Pipeline failure rendered as a JSON error body
pub struct ApiFailure(pub AqiCastError);

impl From<AqiCastError> for ApiFailure {
    fn from(err: AqiCastError) -> Self {
        Self(err)
    }
}

impl ApiFailure {
    fn status(&self) -> StatusCode {
        match self.0 {
            AqiCastError::LocationUnavailable { .. } | AqiCastError::FeatureBuild { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AqiCastError::Config { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {}", self.0);
        let body = ApiError {
            code: self.0.code().to_string(),
            message: self.0.user_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/forecast", get(get_forecast))
        .route("/history", get(get_history))
        .route("/health", get(health))
        .with_state(state)
}

async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<DashboardForecast>, ApiFailure> {
    let forecast = match (query.latitude, query.longitude) {
        (Some(lat), Some(lon)) => {
            let coordinates =
                Coordinates::new(lat, lon).map_err(|e| AqiCastError::config(e.to_string()))?;
            state
                .pipeline
                .run_for(coordinates, Local::now().date_naive())
                .await?
        }
        (None, None) => state.pipeline.run().await?,
        _ => {
            return Err(AqiCastError::config("latitude and longitude must be given together").into());
        }
    };
    Ok(Json(forecast))
}

async fn get_history(State(state): State<AppState>) -> Result<Json<AqiHistory>, ApiFailure> {
    let config = state.history.clone();
    let history = tokio::task::spawn_blocking(move || load_history(&config))
        .await
        .map_err(|e| AqiCastError::history(format!("history loader panicked: {e}")))??;
    Ok(Json(history))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.pipeline.model().name,
        "horizon_days": state.pipeline.horizon_days(),
    }))
}
