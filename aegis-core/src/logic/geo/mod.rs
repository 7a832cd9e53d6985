//! Geo Module
//!
//! Optional enrichment: GPS position from image metadata and a reverse
//! geocoded place name. Every failure here degrades to "no geo" or
//! "geocoding unavailable"; none fails a scan.
//!
//! ## Structure
//! - `gps`: EXIF GPS extraction
//! - `geocode`: Nominatim reverse geocoding client

use serde::{Deserialize, Serialize};

pub mod gps;
pub mod geocode;

pub use gps::{extract_gps, GpsFix};
pub use geocode::ReverseGeocoder;

#[derive(Debug, Clone, thiserror::Error)]
pub enum GeoError {
    #[error("GPS extraction failed: {0}")]
    Extraction(String),

    #[error("Geocoding failed: {0}")]
    Geocoding(String),
}

/// Outcome of the place-name lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeStatus {
    Resolved,
    Unavailable,
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoTag {
    /// 6 decimals
    pub latitude: f64,
    pub longitude: f64,
    /// 1 decimal
    pub altitude: Option<f64>,
    pub maps_link: String,
    pub location_name: Option<String>,
    pub geocode_status: GeocodeStatus,
}

impl GeoTag {
    pub fn new(fix: &GpsFix, location_name: Option<String>, geocode_status: GeocodeStatus) -> Self {
        let latitude = round_to(fix.latitude, 6);
        let longitude = round_to(fix.longitude, 6);
        Self {
            latitude,
            longitude,
            altitude: fix.altitude.map(|a| round_to(a, 1)),
            maps_link: maps_link(latitude, longitude),
            location_name,
            geocode_status,
        }
    }
}

pub fn maps_link(latitude: f64, longitude: f64) -> String {
    format!("https://www.google.com/maps?q={},{}", latitude, longitude)
}

/// Build the tag for a fix, geocoding when a geocoder is configured
pub async fn resolve(fix: &GpsFix, geocoder: Option<&ReverseGeocoder>) -> GeoTag {
    let Some(geocoder) = geocoder else {
        return GeoTag::new(fix, None, GeocodeStatus::NotAttempted);
    };

    match geocoder.reverse(fix.latitude, fix.longitude).await {
        Ok(Some(name)) => {
            log::info!("GPS {:.4}, {:.4} -> {}", fix.latitude, fix.longitude, name);
            GeoTag::new(fix, Some(name), GeocodeStatus::Resolved)
        }
        Ok(None) => GeoTag::new(fix, None, GeocodeStatus::Unavailable),
        Err(e) => {
            log::warn!("{}", e);
            GeoTag::new(fix, None, GeocodeStatus::Unavailable)
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests;
