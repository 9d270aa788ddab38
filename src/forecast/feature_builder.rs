//! Forecast feature construction
//!
//! Turns a daily weather forecast for the resolved coordinates into the
//! fixed-width table the model consumes: one row per future day, columns in
//! the model's schema order.

use chrono::{Datelike, Days, NaiveDate};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::AqiCastError;
use crate::models::{
    Coordinates, DailyConditions, DailyWeather, FeatureSchema, ForecastFeatureRow, ForecastTable,
};
use crate::weather::{WeatherSource, daylight_hours};

/// A feature the builder knows how to derive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Temperature,
    TemperatureMin,
    TemperatureMax,
    Humidity,
    WindSpeed,
    Precipitation,
    Pressure,
    DaylightHours,
    Latitude,
    Longitude,
    Year,
    Month,
    Day,
    DayOfWeek,
    DayOfYear,
}

impl Feature {
    pub const ALL: [Feature; 15] = [
        Feature::Temperature,
        Feature::TemperatureMin,
        Feature::TemperatureMax,
        Feature::Humidity,
        Feature::WindSpeed,
        Feature::Precipitation,
        Feature::Pressure,
        Feature::DaylightHours,
        Feature::Latitude,
        Feature::Longitude,
        Feature::Year,
        Feature::Month,
        Feature::Day,
        Feature::DayOfWeek,
        Feature::DayOfYear,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Feature::Temperature => "temperature",
            Feature::TemperatureMin => "temperature_min",
            Feature::TemperatureMax => "temperature_max",
            Feature::Humidity => "humidity",
            Feature::WindSpeed => "wind_speed",
            Feature::Precipitation => "precipitation",
            Feature::Pressure => "pressure",
            Feature::DaylightHours => "daylight_hours",
            Feature::Latitude => "latitude",
            Feature::Longitude => "longitude",
            Feature::Year => "year",
            Feature::Month => "month",
            Feature::Day => "day",
            Feature::DayOfWeek => "day_of_week",
            Feature::DayOfYear => "day_of_year",
        }
    }

    /// Value for one forecast day; `None` when the weather source left a gap
    fn value(self, coordinates: Coordinates, weather: &DailyWeather) -> Option<f64> {
        let date = weather.date;
        match self {
            Feature::Temperature => weather.temperature(),
            Feature::TemperatureMin => weather.temperature_min,
            Feature::TemperatureMax => weather.temperature_max,
            Feature::Humidity => weather.humidity_mean,
            Feature::WindSpeed => weather.wind_speed_max,
            Feature::Precipitation => weather.precipitation_sum,
            Feature::Pressure => weather.pressure_mean,
            Feature::DaylightHours => Some(daylight_hours(coordinates, date)),
            Feature::Latitude => Some(coordinates.latitude),
            Feature::Longitude => Some(coordinates.longitude),
            Feature::Year => Some(f64::from(date.year())),
            Feature::Month => Some(f64::from(date.month())),
            Feature::Day => Some(f64::from(date.day())),
            Feature::DayOfWeek => Some(f64::from(date.weekday().num_days_from_monday())),
            Feature::DayOfYear => Some(f64::from(date.ordinal())),
        }
    }
}

impl FromStr for Feature {
    type Err = AqiCastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| AqiCastError::feature_build(format!("unknown feature '{s}'")))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds forecast feature tables for a fixed model schema
pub struct FeatureBuilder {
    weather: Arc<dyn WeatherSource>,
    schema: FeatureSchema,
    features: Vec<Feature>,
}

impl FeatureBuilder {
    /// Fails if `schema` names a feature that cannot be derived
    pub fn new(weather: Arc<dyn WeatherSource>, schema: FeatureSchema) -> Result<Self, AqiCastError> {
        let features = schema
            .names()
            .iter()
            .map(|name| name.parse::<Feature>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            weather,
            schema,
            features,
        })
    }

    /// Build one row per day for `today + 1 ..= today + horizon_days`
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    pub async fn build_forecast_features(
        &self,
        coordinates: Coordinates,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<ForecastTable, AqiCastError> {
        if horizon_days == 0 {
            return Err(AqiCastError::feature_build("forecast horizon must be at least one day"));
        }

        let first = today + Days::new(1);
        let last = today + Days::new(u64::from(horizon_days));
        let forecast = self
            .weather
            .daily_forecast(coordinates, first, last)
            .await
            .map_err(|e| AqiCastError::feature_build(format!("weather source unavailable: {e:#}")))?;
        debug!("Weather source returned {} days", forecast.days.len());

        let available = forecast.days_between(first, last);
        if available < horizon_days as usize {
            return Err(AqiCastError::feature_build(format!(
                "only {available} of {horizon_days} forecast days are available after {today}"
            )));
        }

        let mut rows = Vec::with_capacity(horizon_days as usize);
        for day_offset in 1..=horizon_days {
            let date = today + Days::new(u64::from(day_offset));
            let weather = forecast.day(date).ok_or_else(|| {
                AqiCastError::feature_build(format!("no forecast data for {date}"))
            })?;
            rows.push(self.build_row(coordinates, day_offset, weather)?);
        }

        info!(
            "Built {} forecast rows with {} features",
            rows.len(),
            self.schema.len()
        );
        ForecastTable::new(self.schema.clone(), today, rows)
    }

    fn build_row(
        &self,
        coordinates: Coordinates,
        day_offset: u32,
        weather: &DailyWeather,
    ) -> Result<ForecastFeatureRow, AqiCastError> {
        let missing = |what: &str| {
            AqiCastError::feature_build(format!("forecast for {} has no {what}", weather.date))
        };

        let values = self
            .features
            .iter()
            .map(|feature| {
                feature
                    .value(coordinates, weather)
                    .ok_or_else(|| missing(feature.name()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let conditions = DailyConditions {
            temperature: weather.temperature().ok_or_else(|| missing("temperature"))?,
            humidity: weather.humidity_mean.ok_or_else(|| missing("humidity"))?,
            wind_speed: weather.wind_speed_max.ok_or_else(|| missing("wind speed"))?,
        };

        Ok(ForecastFeatureRow {
            day_offset,
            date: weather.date,
            values,
            conditions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherForecast;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::Mutex;

    struct StaticWeather {
        days: Vec<DailyWeather>,
    }

    #[async_trait]
    impl WeatherSource for StaticWeather {
        async fn daily_forecast(
            &self,
            coordinates: Coordinates,
            start: NaiveDate,
            end: NaiveDate,
        ) -> anyhow::Result<WeatherForecast> {
            let days = self
                .days
                .iter()
                .filter(|d| (start..=end).contains(&d.date))
                .cloned()
                .collect();
            Ok(WeatherForecast::new(coordinates, days))
        }
    }

    /// Answers from the location's calendar, ignoring the requested range
    struct LocalCalendarWeather {
        days: Vec<DailyWeather>,
        requested: Mutex<Option<(NaiveDate, NaiveDate)>>,
    }

    #[async_trait]
    impl WeatherSource for LocalCalendarWeather {
        async fn daily_forecast(
            &self,
            coordinates: Coordinates,
            start: NaiveDate,
            end: NaiveDate,
        ) -> anyhow::Result<WeatherForecast> {
            *self.requested.lock().unwrap() = Some((start, end));
            Ok(WeatherForecast::new(coordinates, self.days.clone()))
        }
    }

    struct FailingWeather;

    #[async_trait]
    impl WeatherSource for FailingWeather {
        async fn daily_forecast(
            &self,
            _: Coordinates,
            _: NaiveDate,
            _: NaiveDate,
        ) -> anyhow::Result<WeatherForecast> {
            Err(anyhow!("connection refused"))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn coordinates() -> Coordinates {
        Coordinates::new(40.0, -74.0).unwrap()
    }

    fn weather_days(count: u64) -> Vec<DailyWeather> {
        (0..count)
            .map(|i| DailyWeather {
                date: today() + Days::new(i),
                temperature_mean: Some(2.0 + i as f64),
                temperature_min: Some(-1.0 + i as f64),
                temperature_max: Some(5.0 + i as f64),
                humidity_mean: Some(60.0 + i as f64),
                wind_speed_max: Some(4.0),
                precipitation_sum: Some(0.2 * i as f64),
                pressure_mean: Some(1013.0),
            })
            .collect()
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::new([
            "temperature",
            "humidity",
            "wind_speed",
            "precipitation",
            "month",
            "day_of_week",
            "latitude",
        ])
        .unwrap()
    }

    fn builder(days: u64) -> FeatureBuilder {
        FeatureBuilder::new(Arc::new(StaticWeather { days: weather_days(days) }), schema()).unwrap()
    }

    #[tokio::test]
    async fn test_builds_one_row_per_horizon_day() {
        let table = builder(4)
            .build_forecast_features(coordinates(), today(), 3)
            .await
            .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.schema(), &schema());
        assert_eq!(table.issued_on(), today());
        for (i, row) in table.rows().iter().enumerate() {
            assert_eq!(row.day_offset as usize, i + 1);
            assert_eq!(row.date, today() + Days::new(i as u64 + 1));
            assert_eq!(row.values.len(), schema().len());
        }

        // 2024-01-02 is a Tuesday
        assert_eq!(table.rows()[0].values, vec![3.0, 61.0, 4.0, 0.2, 1.0, 1.0, 40.0]);
        assert_eq!(table.rows()[0].conditions.temperature, 3.0);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(7)]
    #[tokio::test]
    async fn test_row_count_matches_horizon(#[case] horizon: u32) {
        let table = builder(16)
            .build_forecast_features(coordinates(), today(), horizon)
            .await
            .unwrap();
        assert_eq!(table.len(), horizon as usize);
    }

    #[tokio::test]
    async fn test_identical_inputs_give_identical_tables() {
        let builder = builder(4);
        let first = builder.build_forecast_features(coordinates(), today(), 3).await.unwrap();
        let second = builder.build_forecast_features(coordinates(), today(), 3).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_too_few_forecast_days() {
        let err = builder(3)
            .build_forecast_features(coordinates(), today(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AqiCastError::FeatureBuild { .. }));
        assert!(err.to_string().contains("only 2 of 3"));
    }

    #[tokio::test]
    async fn test_requests_dates_after_today() {
        let weather = Arc::new(LocalCalendarWeather {
            days: weather_days(5),
            requested: Mutex::new(None),
        });
        let builder = FeatureBuilder::new(weather.clone(), schema()).unwrap();
        builder
            .build_forecast_features(coordinates(), today(), 3)
            .await
            .unwrap();

        let requested = *weather.requested.lock().unwrap();
        assert_eq!(
            requested,
            Some((today() + Days::new(1), today() + Days::new(3)))
        );
    }

    #[tokio::test]
    async fn test_location_one_day_behind() {
        // the location's calendar starts a day before the caller's today
        let days: Vec<DailyWeather> = weather_days(5)
            .into_iter()
            .map(|d| DailyWeather {
                date: d.date - Days::new(1),
                ..d
            })
            .collect();
        let weather = Arc::new(LocalCalendarWeather {
            days,
            requested: Mutex::new(None),
        });
        let table = FeatureBuilder::new(weather, schema())
            .unwrap()
            .build_forecast_features(coordinates(), today(), 3)
            .await
            .unwrap();

        let dates: Vec<String> = table.rows().iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-02", "2024-01-03", "2024-01-04"]);
        // 2024-01-02 carries the source's second entry
        assert_eq!(table.rows()[0].conditions.temperature, 4.0);
    }

    #[tokio::test]
    async fn test_zero_horizon_is_rejected() {
        let err = builder(4)
            .build_forecast_features(coordinates(), today(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AqiCastError::FeatureBuild { .. }));
    }

    #[tokio::test]
    async fn test_weather_source_failure() {
        let builder = FeatureBuilder::new(Arc::new(FailingWeather), schema()).unwrap();
        let err = builder
            .build_forecast_features(coordinates(), today(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AqiCastError::FeatureBuild { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_missing_weather_value() {
        let mut days = weather_days(4);
        days[2].humidity_mean = None;
        let builder = FeatureBuilder::new(Arc::new(StaticWeather { days }), schema()).unwrap();
        let err = builder
            .build_forecast_features(coordinates(), today(), 3)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("has no humidity"));
    }

    #[test]
    fn test_unknown_feature_in_schema() {
        let schema = FeatureSchema::new(["temperature", "pm25_lag_1"]).unwrap();
        let result = FeatureBuilder::new(Arc::new(FailingWeather), schema);
        assert!(matches!(result, Err(AqiCastError::FeatureBuild { .. })));
    }

    #[test]
    fn test_feature_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>().unwrap(), feature);
        }
    }
}
