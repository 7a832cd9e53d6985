//! Pipeline Types

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::constants::DEFAULT_INFERENCE_TIMEOUT_SECS;
use crate::logic::detector::{Detection, DetectionThresholds, ImageSize};
use crate::logic::geo::GpsFix;
use crate::logic::threat::ThreatAssessment;

/// One uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(original_filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_filename: original_filename.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Originals and annotated copies are written here
    pub upload_dir: PathBuf,
    pub thresholds: DetectionThresholds,
    pub inference_timeout: Duration,
}

impl PipelineConfig {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            thresholds: DetectionThresholds::default(),
            inference_timeout: Duration::from_secs(DEFAULT_INFERENCE_TIMEOUT_SECS),
        }
    }
}

/// Request lifecycle. `Failed` is only reachable from `Decoding` and `Detecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    Received,
    Decoding,
    Detecting,
    Classifying,
    Logging,
    Responding,
    Failed,
}

impl ScanStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStage::Received => "RECEIVED",
            ScanStage::Decoding => "DECODING",
            ScanStage::Detecting => "DETECTING",
            ScanStage::Classifying => "CLASSIFYING",
            ScanStage::Logging => "LOGGING",
            ScanStage::Responding => "RESPONDING",
            ScanStage::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the transport layer needs to answer a successful scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub scan_id: String,
    /// Stored original name, also the log's `image_filename`
    pub image_filename: String,
    pub detections: Vec<Detection>,
    pub threat: ThreatAssessment,
    /// File names inside the upload directory; `None` when the write failed
    pub original_file: Option<String>,
    pub annotated_file: Option<String>,
    /// Rounded to 0.1 ms
    pub inference_ms: f64,
    pub image_size: ImageSize,
    #[serde(skip)]
    pub gps: Option<GpsFix>,
    /// Set when the detection log could not be written
    pub log_warning: Option<String>,
}
