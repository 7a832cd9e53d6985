//! Detection Log Record
//!
//! One row of the detection log. Immutable once written.
//! Field order is the on-disk column order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::detector::Detection;
use crate::logic::threat::{RiskLevel, ThreatAssessment, ThreatTier};

/// Column order of the CSV store and export
pub const HEADERS: [&str; 13] = [
    "timestamp",
    "image_filename",
    "threat_level",
    "total_detections",
    "high_risk_count",
    "class_name",
    "confidence",
    "risk_level",
    "box_x1",
    "box_y1",
    "box_x2",
    "box_y2",
    "inference_ms",
];

// ============================================================================
// RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(with = "log_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub image_filename: String,
    pub threat_level: ThreatTier,
    pub total_detections: usize,
    pub high_risk_count: usize,
    /// Empty on the summary row of a zero-detection scan
    pub class_name: Option<String>,
    pub confidence: Option<f32>,
    pub risk_level: Option<RiskLevel>,
    pub box_x1: i32,
    pub box_y1: i32,
    pub box_x2: i32,
    pub box_y2: i32,
    pub inference_ms: f64,
}

impl LogRecord {
    /// Summary row of a scan with no detections
    pub fn is_summary(&self) -> bool {
        self.class_name.is_none()
    }
}

// ============================================================================
// SCAN ENTRY
// ============================================================================

/// Everything logged for one processed image
#[derive(Debug, Clone)]
pub struct ScanEntry<'a> {
    pub timestamp: DateTime<Utc>,
    pub image_filename: &'a str,
    pub assessment: &'a ThreatAssessment,
    pub detections: &'a [Detection],
    pub inference_ms: f64,
}

impl ScanEntry<'_> {
    /// One record per detection, or a single summary record
    pub fn records(&self) -> Vec<LogRecord> {
        // Sub-second precision is not stored
        let timestamp = truncate_to_seconds(self.timestamp);
        let base = LogRecord {
            timestamp,
            image_filename: self.image_filename.to_string(),
            threat_level: self.assessment.threat_level,
            total_detections: self.detections.len(),
            high_risk_count: self.assessment.stats.high_risk,
            class_name: None,
            confidence: None,
            risk_level: None,
            box_x1: 0,
            box_y1: 0,
            box_x2: 0,
            box_y2: 0,
            inference_ms: self.inference_ms,
        };

        if self.detections.is_empty() {
            return vec![base];
        }

        self.detections
            .iter()
            .map(|det| LogRecord {
                class_name: Some(det.class_name.clone()),
                confidence: Some(det.confidence),
                risk_level: Some(det.risk_level),
                box_x1: det.bbox.x1,
                box_y1: det.bbox.y1,
                box_x2: det.bbox.x2,
                box_y2: det.bbox.y2,
                ..base.clone()
            })
            .collect()
    }
}

fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.timestamp(), 0).unwrap_or(ts)
}

/// `%Y-%m-%d %H:%M:%S`, always UTC
pub mod log_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::constants::LOG_TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(LOG_TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), LOG_TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
