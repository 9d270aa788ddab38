//! Coordinates model for the resolved user location

use crate::AqiCastError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated geographic coordinates
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in decimal degrees, [-180, 180]
    pub longitude: f64,
}

impl Coordinates {
    /// Create validated coordinates
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AqiCastError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AqiCastError::location(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AqiCastError::location(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Generate a cache key for data about this location on `date`
    #[must_use]
    pub fn cache_key(&self, prefix: &str, date: &str) -> String {
        let (lat, lon) = self.rounded(2);
        format!("{prefix}:{lat:.2}:{lon:.2}:{date}")
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_cache_key() {
        let coordinates = Coordinates::new(40.7128, -74.0060).unwrap();
        let key = coordinates.cache_key("weather", "2024-01-01");
        assert_eq!(key, "weather:40.71:-74.01:2024-01-01");
    }

    #[test]
    fn test_rounded_coordinates() {
        let coordinates = Coordinates::new(46.818_234, 8.227_456).unwrap();
        let (lat, lon) = coordinates.rounded(2);
        assert_eq!(lat, 46.82);
        assert_eq!(lon, 8.23);
    }

    #[rstest]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    #[case(0.0, 0.0)]
    #[case(40.0, -74.0)]
    fn test_valid_coordinates(#[case] lat: f64, #[case] lon: f64) {
        assert!(Coordinates::new(lat, lon).is_ok());
    }

    #[rstest]
    #[case(90.1, 0.0)]
    #[case(-91.0, 0.0)]
    #[case(0.0, 180.5)]
    #[case(0.0, -181.0)]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    fn test_invalid_coordinates(#[case] lat: f64, #[case] lon: f64) {
        let err = Coordinates::new(lat, lon).unwrap_err();
        assert!(matches!(err, AqiCastError::LocationUnavailable { .. }));
    }

    #[test]
    fn test_display() {
        let coordinates = Coordinates::new(40.0, -74.0).unwrap();
        assert_eq!(coordinates.to_string(), "40.0000, -74.0000");
    }
}
