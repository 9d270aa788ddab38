//! Historical AQI series for trend display
//!
//! Reads the observation file, averages per calendar day, keeps the
//! trailing window ending at the latest day and bins the window's values.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

use crate::AqiCastError;
use crate::config::HistoryConfig;

/// One row of the historical data file; other columns are ignored
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoricalObservation {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub aqi: Option<f64>,
}

impl HistoricalObservation {
    /// Calendar date built from the `year`, `month` and `day` columns
    pub fn timestamp(&self) -> Result<NaiveDate, AqiCastError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            AqiCastError::history(format!(
                "invalid date {}-{}-{}",
                self.year, self.month, self.day
            ))
        })
    }
}

/// Mean AQI of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAqi {
    pub timestamp: NaiveDate,
    pub aqi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Series consumed by the trend and distribution charts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AqiHistory {
    pub daily: Vec<DailyAqi>,
    pub histogram: Vec<HistogramBin>,
}

impl AqiHistory {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }
}

/// Read every observation from a CSV file with a header row
#[instrument]
pub fn load_observations(path: &Path) -> Result<Vec<HistoricalObservation>, AqiCastError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AqiCastError::history(format!("{}: {e}", path.display())))?;

    reader
        .deserialize()
        .collect::<Result<Vec<HistoricalObservation>, _>>()
        .map_err(|e| AqiCastError::history(format!("{}: {e}", path.display())))
}

/// Average AQI per day, sorted by date. Missing or non-finite readings are
/// skipped; days without any reading are dropped.
pub fn daily_means(observations: &[HistoricalObservation]) -> Result<Vec<DailyAqi>, AqiCastError> {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for observation in observations {
        let timestamp = observation.timestamp()?;
        let Some(aqi) = observation.aqi.filter(|v| v.is_finite()) else {
            continue;
        };
        let entry = sums.entry(timestamp).or_insert((0.0, 0));
        entry.0 += aqi;
        entry.1 += 1;
    }

    Ok(sums
        .into_iter()
        .map(|(timestamp, (sum, count))| DailyAqi {
            timestamp,
            aqi: sum / count as f64,
        })
        .collect())
}

/// Days on or after `latest - window_days`
#[must_use]
pub fn trailing_window(daily: &[DailyAqi], window_days: u32) -> Vec<DailyAqi> {
    let Some(latest) = daily.iter().map(|d| d.timestamp).max() else {
        return Vec::new();
    };
    let start = latest
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN);
    daily
        .iter()
        .filter(|d| d.timestamp >= start)
        .cloned()
        .collect()
}

/// Equal-width bins spanning the value range; the last bin is closed
#[must_use]
pub fn histogram(values: &[f64], bins: u32) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lower, upper) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (upper - lower) / f64::from(bins);

    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lower + width * f64::from(i),
            upper: lower + width * f64::from(i + 1),
            count: 0,
        })
        .collect();

    let last = result.len() - 1;
    for value in values {
        let index = (((value - lower) / width).floor() as usize).min(last);
        result[index].count += 1;
    }
    result
}

/// Load the configured file and prepare both chart series
pub fn load_history(config: &HistoryConfig) -> Result<AqiHistory, AqiCastError> {
    let observations = load_observations(Path::new(&config.path))?;
    let daily = trailing_window(&daily_means(&observations)?, config.window_days);
    let values: Vec<f64> = daily.iter().map(|d| d.aqi).collect();

    info!(
        "Loaded {} observations, {} days in window",
        observations.len(),
        daily.len()
    );
    Ok(AqiHistory {
        histogram: histogram(&values, config.histogram_bins),
        daily,
    })
}
