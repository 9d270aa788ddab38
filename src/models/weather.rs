//! Daily weather covariates and display methods

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Weather summary for one calendar day at the forecast location
///
/// Values are optional because the upstream service reports gaps as nulls.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyWeather {
    /// Local calendar date
    pub date: NaiveDate,
    /// Mean 2 m temperature in Celsius
    pub temperature_mean: Option<f64>,
    /// Minimum 2 m temperature in Celsius
    pub temperature_min: Option<f64>,
    /// Maximum 2 m temperature in Celsius
    pub temperature_max: Option<f64>,
    /// Mean relative humidity in percent
    pub humidity_mean: Option<f64>,
    /// Maximum 10 m wind speed in m/s
    pub wind_speed_max: Option<f64>,
    /// Precipitation sum in mm
    pub precipitation_sum: Option<f64>,
    /// Mean surface pressure in hPa
    pub pressure_mean: Option<f64>,
}

impl DailyWeather {
    /// An entry for `date` with every measurement missing
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            temperature_mean: None,
            temperature_min: None,
            temperature_max: None,
            humidity_mean: None,
            wind_speed_max: None,
            precipitation_sum: None,
            pressure_mean: None,
        }
    }

    /// Mean temperature, falling back to the midpoint of min and max
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.temperature_mean.or(match (self.temperature_min, self.temperature_max) {
            (Some(min), Some(max)) => Some((min + max) / 2.0),
            _ => None,
        })
    }
}

/// Conditions echoed next to each prediction
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DailyConditions {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
}

impl DailyConditions {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }

    /// Format humidity with unit
    #[must_use]
    pub fn format_humidity(&self) -> String {
        format!("{:.0}%", self.humidity)
    }

    /// Format wind speed with unit
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} m/s", self.wind_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_fallback_to_midpoint() {
        let mut day = DailyWeather::empty(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(day.temperature(), None);

        day.temperature_min = Some(2.0);
        day.temperature_max = Some(8.0);
        assert_eq!(day.temperature(), Some(5.0));

        day.temperature_mean = Some(4.2);
        assert_eq!(day.temperature(), Some(4.2));
    }

    #[test]
    fn test_conditions_formatting() {
        let conditions = DailyConditions {
            temperature: 21.34,
            humidity: 64.6,
            wind_speed: 3.05,
        };
        assert_eq!(conditions.format_temperature(), "21.3°C");
        assert_eq!(conditions.format_humidity(), "65%");
        assert_eq!(conditions.format_wind(), "3.0 m/s");
    }
}
