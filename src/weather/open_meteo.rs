//! `OpenMeteo` daily forecast client and response conversion

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use rand::RngExt;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use super::WeatherSource;
use crate::cache;
use crate::config::AqiCastConfig;
use crate::http::build_client;
use crate::models::{Coordinates, DailyWeather, WeatherForecast};

const DAILY_VARIABLES: &str = "temperature_2m_mean,temperature_2m_min,temperature_2m_max,relative_humidity_2m_mean,wind_speed_10m_max,precipitation_sum,surface_pressure_mean";

/// Daily forecast client for the `OpenMeteo` API (no API key required)
pub struct OpenMeteoClient {
    client: ClientWithMiddleware,
    base_url: String,
    cache_ttl: Option<Duration>,
}

impl OpenMeteoClient {
    pub fn new(config: &AqiCastConfig) -> Result<Self> {
        let client = build_client(config.weather.timeout_seconds, config.weather.max_retries)?;
        let cache_ttl = config
            .cache
            .enabled
            .then(|| Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600));

        Ok(Self {
            client,
            base_url: config.weather.base_url.trim_end_matches('/').to_string(),
            cache_ttl,
        })
    }

    fn forecast_url(&self, coordinates: Coordinates, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&daily={}&timezone=auto&start_date={}&end_date={}&wind_speed_unit=ms",
            self.base_url,
            coordinates.latitude,
            coordinates.longitude,
            DAILY_VARIABLES,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )
    }

    async fn fetch(
        &self,
        coordinates: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeatherForecast> {
        tracing::debug!("Calling the API");
        let response = self
            .client
            .get(self.forecast_url(coordinates, start, end))
            .send()
            .await
            .with_context(|| "OpenMeteo request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| "Failed to read OpenMeteo response")?;
        if !status.is_success() {
            bail!("OpenMeteo returned {status}: {}", api_error_reason(&body));
        }

        parse_forecast(&body, coordinates)
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn daily_forecast(
        &self,
        coordinates: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeatherForecast> {
        if end < start {
            bail!("Invalid forecast range {start}..{end}");
        }
        let key = coordinates.cache_key("weather", &format!("{start}:{end}"));

        if self.cache_ttl.is_some() {
            match cache::get::<WeatherForecast>(&key).await {
                Ok(Some(cached)) => return Ok(cached),
                Ok(None) => {}
                Err(e) => tracing::warn!("Weather cache lookup failed: {e:#}"),
            }
        }

        let forecast = self.fetch(coordinates, start, end).await?;

        if let Some(ttl) = self.cache_ttl {
            let jitter: f32 = rand::rng().random_range(0.9..1.1);
            if let Err(e) = cache::put(&key, forecast.clone(), ttl.mul_f32(jitter)).await {
                tracing::warn!("Weather cache store failed: {e:#}");
            }
        }
        Ok(forecast)
    }
}

/// `OpenMeteo` daily forecast response
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailyData>,
}

/// Parallel per-day arrays; absent variables deserialize as `None`
#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    #[serde(rename = "temperature_2m_mean")]
    temperature_mean: Option<Vec<Option<f64>>>,
    #[serde(rename = "temperature_2m_min")]
    temperature_min: Option<Vec<Option<f64>>>,
    #[serde(rename = "temperature_2m_max")]
    temperature_max: Option<Vec<Option<f64>>>,
    #[serde(rename = "relative_humidity_2m_mean")]
    humidity_mean: Option<Vec<Option<f64>>>,
    #[serde(rename = "wind_speed_10m_max")]
    wind_speed_max: Option<Vec<Option<f64>>>,
    precipitation_sum: Option<Vec<Option<f64>>>,
    surface_pressure_mean: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    reason: String,
}

fn api_error_reason(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.reason)
        .unwrap_or_else(|_| "unexpected response".to_string())
}

fn value_at(values: &Option<Vec<Option<f64>>>, i: usize) -> Option<f64> {
    values
        .as_ref()
        .and_then(|v| v.get(i).copied().flatten())
        .filter(|v| v.is_finite())
}

/// Convert an `OpenMeteo` daily forecast body into a [`WeatherForecast`]
pub fn parse_forecast(body: &str, coordinates: Coordinates) -> Result<WeatherForecast> {
    let response: ForecastResponse =
        serde_json::from_str(body).with_context(|| "Failed to parse OpenMeteo forecast response")?;
    let daily = response
        .daily
        .ok_or_else(|| anyhow!("OpenMeteo response has no daily data"))?;

    let mut days = Vec::with_capacity(daily.time.len());
    for (i, time) in daily.time.iter().enumerate() {
        let date = NaiveDate::parse_from_str(time, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{time}' in OpenMeteo response"))?;
        days.push(DailyWeather {
            date,
            temperature_mean: value_at(&daily.temperature_mean, i),
            temperature_min: value_at(&daily.temperature_min, i),
            temperature_max: value_at(&daily.temperature_max, i),
            humidity_mean: value_at(&daily.humidity_mean, i),
            wind_speed_max: value_at(&daily.wind_speed_max, i),
            precipitation_sum: value_at(&daily.precipitation_sum, i),
            pressure_mean: value_at(&daily.surface_pressure_mean, i),
        });
    }

    Ok(WeatherForecast::new(coordinates, days))
}
