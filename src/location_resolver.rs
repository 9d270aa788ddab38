//! Location Resolution Module
//!
//! Resolves the current user's approximate coordinates. Any failure is
//! reported as [`AqiCastError::LocationUnavailable`]; there is no retry and no
//! cached fallback.

use crate::AqiCastError;
use crate::config::AqiCastConfig;
use crate::http::build_client;
use crate::models::Coordinates;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Resolves coordinates for the current user
#[async_trait]
pub trait CoordinateResolver: Send + Sync {
    async fn resolve_coordinates(&self) -> Result<Coordinates, AqiCastError>;
}

/// Coordinates supplied up front (configuration or command line)
pub struct FixedResolver {
    coordinates: Coordinates,
}

impl FixedResolver {
    #[must_use]
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl CoordinateResolver for FixedResolver {
    async fn resolve_coordinates(&self) -> Result<Coordinates, AqiCastError> {
        Ok(self.coordinates)
    }
}

/// IP-based geolocation against an ip-api.com compatible endpoint
pub struct IpGeolocationResolver {
    client: ClientWithMiddleware,
    service_url: String,
}

impl IpGeolocationResolver {
    pub fn new(config: &AqiCastConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(config.location.timeout_seconds, 0)?,
            service_url: config.location.service_url.clone(),
        })
    }
}

#[async_trait]
impl CoordinateResolver for IpGeolocationResolver {
    #[instrument(skip(self), fields(service = %self.service_url))]
    async fn resolve_coordinates(&self) -> Result<Coordinates, AqiCastError> {
        debug!("Looking up coordinates by IP");

        let response = self
            .client
            .get(&self.service_url)
            .send()
            .await
            .map_err(|e| AqiCastError::location(format!("lookup request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AqiCastError::location(format!(
                "lookup service returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AqiCastError::location(format!("failed to read lookup response: {e}")))?;

        let coordinates = parse_geolocation(&body)?;
        debug!("Resolved coordinates: {}", coordinates);
        Ok(coordinates)
    }
}

/// Build the resolver the configuration asks for
pub fn resolver_from_config(
    config: &AqiCastConfig,
) -> anyhow::Result<Box<dyn CoordinateResolver>> {
    match (config.location.latitude, config.location.longitude) {
        (Some(lat), Some(lon)) => Ok(Box::new(FixedResolver::new(Coordinates::new(lat, lon)?))),
        _ => Ok(Box::new(IpGeolocationResolver::new(config)?)),
    }
}

#[derive(Debug, Deserialize)]
struct GeolocationResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Parse an ip-api.com style body into validated coordinates
pub fn parse_geolocation(body: &str) -> Result<Coordinates, AqiCastError> {
    let response: GeolocationResponse = serde_json::from_str(body)
        .map_err(|e| AqiCastError::location(format!("malformed lookup response: {e}")))?;

    if let Some(status) = response.status.as_deref() {
        if status != "success" {
            let reason = response.message.as_deref().unwrap_or("no reason given");
            return Err(AqiCastError::location(format!(
                "lookup failed with status '{status}': {reason}"
            )));
        }
    }

    match (response.lat, response.lon) {
        (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
        _ => Err(AqiCastError::location("lookup response has no coordinates")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let body = r#"{"status":"success","country":"United States","lat":40.7128,"lon":-74.006,"query":"1.2.3.4"}"#;
        let coordinates = parse_geolocation(body).unwrap();
        assert_eq!(coordinates.latitude, 40.7128);
        assert_eq!(coordinates.longitude, -74.006);
    }

    #[test]
    fn test_parse_failure_status() {
        let body = r#"{"status":"fail","message":"reserved range","query":"127.0.0.1"}"#;
        let err = parse_geolocation(body).unwrap_err();
        assert!(matches!(err, AqiCastError::LocationUnavailable { .. }));
        assert!(err.to_string().contains("reserved range"));
    }

    #[test]
    fn test_parse_malformed_and_out_of_range() {
        assert!(matches!(
            parse_geolocation("not json"),
            Err(AqiCastError::LocationUnavailable { .. })
        ));
        assert!(matches!(
            parse_geolocation(r#"{"status":"success"}"#),
            Err(AqiCastError::LocationUnavailable { .. })
        ));
        assert!(matches!(
            parse_geolocation(r#"{"lat": 120.0, "lon": 0.0}"#),
            Err(AqiCastError::LocationUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_fixed_resolver() {
        let coordinates = Coordinates::new(46.8182, 8.2275).unwrap();
        let resolver = FixedResolver::new(coordinates);
        assert_eq!(resolver.resolve_coordinates().await.unwrap(), coordinates);
    }

    #[test]
    fn test_resolver_from_config_uses_fixed_coordinates() {
        let mut config = AqiCastConfig::default();
        config.location.latitude = Some(40.0);
        config.location.longitude = Some(-74.0);
        assert!(resolver_from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_location_unavailable() {
        let mut config = AqiCastConfig::default();
        config.location.service_url = "http://127.0.0.1:9/json".to_string();
        config.location.timeout_seconds = 2;
        let resolver = IpGeolocationResolver::new(&config).unwrap();
        let err = resolver.resolve_coordinates().await.unwrap_err();
        assert!(matches!(err, AqiCastError::LocationUnavailable { .. }));
    }
}
