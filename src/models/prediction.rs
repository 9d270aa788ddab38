//! Prediction output model

use super::DailyConditions;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicted AQI for one forecast day, with the weather it was based on
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionRow {
    pub predicted_aqi: f64,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    pub date: NaiveDate,
}

impl PredictionRow {
    #[must_use]
    pub fn new(predicted_aqi: f64, conditions: DailyConditions, date: NaiveDate) -> Self {
        Self {
            predicted_aqi,
            temperature: conditions.temperature,
            humidity: conditions.humidity,
            wind_speed: conditions.wind_speed,
            date,
        }
    }

    #[must_use]
    pub fn conditions(&self) -> DailyConditions {
        DailyConditions {
            temperature: self.temperature,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
        }
    }
}

impl fmt::Display for PredictionRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditions = self.conditions();
        write!(
            f,
            "{}: {:.0} AQI (Temp: {} | Hum: {} | Wind: {})",
            self.date,
            self.predicted_aqi,
            conditions.format_temperature(),
            conditions.format_humidity(),
            conditions.format_wind()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let row = PredictionRow::new(
            57.4,
            DailyConditions {
                temperature: 4.0,
                humidity: 71.0,
                wind_speed: 5.5,
            },
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );
        assert_eq!(
            row.to_string(),
            "2024-01-02: 57 AQI (Temp: 4.0°C | Hum: 71% | Wind: 5.5 m/s)"
        );
    }
}
