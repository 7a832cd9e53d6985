//! Reverse Geocoding
//!
//! Nominatim-compatible `/reverse` lookups. One retry with backoff, then give up.

use std::time::Duration;

use serde::Deserialize;

use super::GeoError;
use crate::constants::{DEFAULT_GEOCODER_URL, ENRICHMENT_HTTP_TIMEOUT_SECS, GEOCODER_USER_AGENT};
use crate::logic::retry::{default_backoff, retry_once};

/// Address components tried in order; the first three distinct ones are kept
const ADDRESS_KEYS: [&str; 6] = ["city", "town", "village", "county", "state", "country"];
const MAX_NAME_PARTS: usize = 3;

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    display_name: Option<String>,
}

pub struct ReverseGeocoder {
    base_url: String,
    http_client: reqwest::Client,
    backoff: Duration,
}

impl ReverseGeocoder {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GeoError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ENRICHMENT_HTTP_TIMEOUT_SECS))
            .user_agent(GEOCODER_USER_AGENT)
            .build()
            .map_err(|e| GeoError::Geocoding(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            backoff: default_backoff(),
        })
    }

    pub fn nominatim() -> Result<Self, GeoError> {
        Self::new(DEFAULT_GEOCODER_URL)
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Human-readable place name, `None` when the service knows nothing
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<String>, GeoError> {
        retry_once("Reverse geocoding", self.backoff, || self.reverse_once(latitude, longitude)).await
    }

    async fn reverse_once(&self, latitude: f64, longitude: f64) -> Result<Option<String>, GeoError> {
        let url = format!("{}/reverse", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("accept-language", "en".to_string()),
            ])
            .send()
            .await
            .map_err(|e| GeoError::Geocoding(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeoError::Geocoding(format!("Server error: {}", response.status().as_u16())));
        }

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| GeoError::Geocoding(format!("Parse error: {}", e)))?;

        Ok(place_name(&body))
    }
}

fn place_name(body: &ReverseResponse) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(address) = &body.address {
        for key in ADDRESS_KEYS {
            if let Some(value) = address.get(key).and_then(|v| v.as_str()) {
                if !parts.contains(&value) {
                    parts.push(value);
                }
            }
        }
    }

    if parts.is_empty() {
        body.display_name.clone().filter(|n| !n.is_empty())
    } else {
        parts.truncate(MAX_NAME_PARTS);
        Some(parts.join(", "))
    }
}
