//! Weather forecast collection returned by a weather source

use super::{Coordinates, DailyWeather};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Daily weather forecast for one location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherForecast {
    /// Location for this forecast
    pub coordinates: Coordinates,
    /// Daily entries (sorted by date)
    pub days: Vec<DailyWeather>,
    /// When this forecast was retrieved
    pub retrieved_at: DateTime<Utc>,
}

impl WeatherForecast {
    /// Create new forecast; entries are sorted by date
    #[must_use]
    pub fn new(coordinates: Coordinates, mut days: Vec<DailyWeather>) -> Self {
        days.sort_by_key(|d| d.date);
        Self {
            coordinates,
            days,
            retrieved_at: Utc::now(),
        }
    }

    /// Get the entry for a specific date
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&DailyWeather> {
        self.days.iter().find(|d| d.date == date)
    }

    /// Number of entries dated within `start..=end`
    #[must_use]
    pub fn days_between(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.days
            .iter()
            .filter(|d| (start..=end).contains(&d.date))
            .count()
    }
}
