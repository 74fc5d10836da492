//! MapQuest geocoding client

use crate::config::{GeocoderConfig, GeocoderProvider};
use async_trait::async_trait;
use devcamper_query::{GeoPoint, Geocoder, GeocodingFailure, QueryError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "mapquest";

/// Geocodes postal codes and addresses through the MapQuest Geocoding API.
pub struct MapQuestGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MapQuestResponse {
    info: MapQuestInfo,
    #[serde(default)]
    results: Vec<MapQuestResult>,
}

#[derive(Debug, Deserialize)]
struct MapQuestInfo {
    statuscode: i64,
    #[serde(default)]
    messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Debug, Deserialize)]
struct MapQuestLocation {
    #[serde(rename = "latLng")]
    lat_lng: LatLng,
    #[serde(rename = "geocodeQuality", default)]
    geocode_quality: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl MapQuestGeocoder {
    pub fn new(config: &GeocoderConfig) -> std::result::Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Build the geocoder selected by `config.provider`.
    pub fn from_config(config: &GeocoderConfig) -> std::result::Result<Self, reqwest::Error> {
        match config.provider {
            GeocoderProvider::Mapquest => Self::new(config),
        }
    }

    fn unavailable(code: &str, reason: impl Into<String>) -> QueryError {
        QueryError::Geocoding {
            code: code.to_string(),
            reason: GeocodingFailure::Unavailable(reason.into()),
        }
    }

    async fn request(&self, code: &str) -> Result<MapQuestResponse> {
        let url = format!(
            "{}/geocoding/v1/address?key={}&location={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(code)
        );

        // Strip the URL from errors so the API key never reaches logs or clients.
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::unavailable(code, e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(
                code,
                format!("geocoder responded with status {}", response.status()),
            ));
        }

        response.json::<MapQuestResponse>().await.map_err(|e| {
            Self::unavailable(
                code,
                format!("malformed geocoder response: {}", e.without_url()),
            )
        })
    }
}

/// Usable candidates of a MapQuest response, best match first.
///
/// Country-level matches are MapQuest's fallback for unknown input and are discarded.
fn candidates(code: &str, response: MapQuestResponse) -> Result<Vec<GeoPoint>> {
    if response.info.statuscode != 0 {
        return Err(MapQuestGeocoder::unavailable(
            code,
            format!(
                "status {}: {}",
                response.info.statuscode,
                response.info.messages.join("; ")
            ),
        ));
    }

    Ok(response
        .results
        .into_iter()
        .flat_map(|result| result.locations)
        .filter(|location| location.geocode_quality.as_deref() != Some("COUNTRY"))
        .filter_map(|location| GeoPoint::new(location.lat_lng.lat, location.lat_lng.lng))
        .collect())
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    async fn geocode(&self, code: &str) -> Result<Vec<GeoPoint>> {
        let outcome = match self.request(code).await {
            Ok(response) => candidates(code, response),
            Err(err) => Err(err),
        };

        let label = match &outcome {
            Ok(points) if points.is_empty() => "no_results",
            Ok(_) => "ok",
            Err(_) => "error",
        };
        crate::metrics::GEOCODER_REQUESTS_TOTAL
            .with_label_values(&[PROVIDER, label])
            .inc();

        outcome
    }
}
