//! Scan, log and dashboard payloads

use serde::{Deserialize, Serialize};

use aegis_core::logic::analytics::AnalyticsSnapshot;
use aegis_core::logic::analyst::SitrepResult;
use aegis_core::logic::detector::{Detection, ImageSize};
use aegis_core::logic::geo::GeoTag;
use aegis_core::{LogRecord, ThreatAssessment};

/// Uploaded files are served from here
pub const UPLOADS_URL_PREFIX: &str = "/static/uploads";

pub fn upload_url(file_name: &str) -> String {
    format!("{}/{}", UPLOADS_URL_PREFIX, file_name)
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub success: bool,
    pub scan_id: String,
    pub detections: Vec<Detection>,
    pub threat: ThreatAssessment,
    pub annotated_path: Option<String>,
    pub original_path: Option<String>,
    pub inference_ms: f64,
    pub image_size: ImageSize,
    pub geo: Option<GeoTag>,
    pub sitrep: SitrepResult,
    pub analyst_enabled: bool,
    pub log_warning: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub success: bool,
    pub count: usize,
    pub logs: Vec<LogRecord>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub data: AnalyticsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_ready: bool,
    pub profile: String,
    pub detector: Option<String>,
    /// Timed-out inferences still holding the model
    pub stalled_inferences: usize,
    pub analyst_enabled: bool,
    pub geocoding_enabled: bool,
    pub version: &'static str,
    pub timestamp: i64,
}
