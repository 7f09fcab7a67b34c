use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum GeolocateError {
    #[error("lookup refused: {0}")]
    Refused(String),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct GeoResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    #[serde(default)]
    message: String,
}

/// Asks the configured IP-geolocation endpoint where we are.
pub async fn current_position(
    http: &Client,
    endpoint: &Url,
) -> Result<(f64, f64), GeolocateError> {
    debug!("GET {endpoint}");
    let response = http
        .get(endpoint.clone())
        .send()
        .await?
        .error_for_status()?;
    let geo: GeoResponse = response.json().await?;
    if geo.status != "success" {
        let reason = if geo.message.is_empty() {
            geo.status
        } else {
            geo.message
        };
        return Err(GeolocateError::Refused(reason));
    }
    Ok((geo.lat, geo.lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_lookup() {
        let geo: GeoResponse =
            serde_json::from_str(r#"{"status":"success","lat":40.7128,"lon":-74.0060}"#).unwrap();
        assert_eq!(geo.status, "success");
        assert_eq!(geo.lat, 40.7128);
        assert_eq!(geo.lon, -74.0060);
    }

    #[test]
    fn parses_refused_lookup() {
        let geo: GeoResponse =
            serde_json::from_str(r#"{"status":"fail","message":"private range"}"#).unwrap();
        assert_eq!(geo.status, "fail");
        assert_eq!(geo.message, "private range");
    }
}
