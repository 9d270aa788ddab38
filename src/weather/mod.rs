use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sunrise::{Coordinates as SolarCoordinates, SolarDay, SolarEvent};

use crate::models::{Coordinates, WeatherForecast};

pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

/// Source of daily weather forecasts for a location
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch daily entries for the calendar dates `start..=end`. Dates are
    /// absolute, so the result does not depend on the location's time zone.
    async fn daily_forecast(
        &self,
        coordinates: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeatherForecast>;
}

/// Hours between sunrise and sunset at `coordinates` on `date`.
///
/// Falls back to a 06:00-19:00 day when the sun does not rise or set.
#[must_use]
pub fn daylight_hours(coordinates: Coordinates, date: NaiveDate) -> f64 {
    let fallback = || {
        let start = NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default();
        let end = NaiveTime::from_hms_opt(19, 0, 0).unwrap_or_default();
        (end - start).num_minutes() as f64 / 60.0
    };

    let Some(solar) = SolarCoordinates::new(coordinates.latitude, coordinates.longitude) else {
        return fallback();
    };
    let solar_day = SolarDay::new(solar, date);

    match (
        solar_day.event_time(SolarEvent::Sunrise),
        solar_day.event_time(SolarEvent::Sunset),
    ) {
        (Some(sunrise), Some(sunset)) if sunset > sunrise => {
            (sunset - sunrise).num_minutes() as f64 / 60.0
        }
        _ => fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daylight_hours_mid_latitude() {
        let coordinates = Coordinates::new(40.0, -74.0).unwrap();
        let winter = daylight_hours(coordinates, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        let summer = daylight_hours(coordinates, NaiveDate::from_ymd_opt(2024, 6, 21).unwrap());

        assert!(winter > 8.0 && winter < 11.0, "winter daylight {winter}");
        assert!(summer > 14.0 && summer < 16.0, "summer daylight {summer}");
    }
}
