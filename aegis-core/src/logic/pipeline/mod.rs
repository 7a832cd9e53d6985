//! Pipeline Module
//!
//! Per-request orchestration:
//! RECEIVED → DECODING → DETECTING → CLASSIFYING → LOGGING → RESPONDING.
//! A failure while decoding or detecting ends the scan in FAILED with
//! nothing logged and no artifacts kept. Everything after detection
//! degrades instead of failing.
//!
//! ## Structure
//! - `types`: Upload, PipelineConfig, ScanStage, ScanOutcome
//! - `orchestrator`: Pipeline (blocking; run it on a blocking pool)
//!
//! ## Usage
//! ```ignore
//! let pipeline = Pipeline::new(detector, classifier, log, PipelineConfig::new("static/uploads"))?;
//! let outcome = pipeline.run(Upload::new("drone.jpg", bytes))?;
//! ```

pub mod types;
pub mod orchestrator;


pub use types::{PipelineConfig, ScanOutcome, ScanStage, Upload};
pub use orchestrator::{sanitize_filename, Pipeline};

use crate::logic::detector::DetectorError;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference timed out after {0}s")]
    InferenceTimeout(u64),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl PipelineError {
    /// Stage the scan was in when it failed. `None` for errors raised
    /// outside a scan (pipeline construction).
    pub fn stage(&self) -> Option<ScanStage> {
        match self {
            PipelineError::UnsupportedFile(_) | PipelineError::Decode(_) => Some(ScanStage::Decoding),
            PipelineError::ModelUnavailable(_)
            | PipelineError::InferenceTimeout(_)
            | PipelineError::InferenceFailed(_) => Some(ScanStage::Detecting),
            PipelineError::Storage(_) => None,
        }
    }
}

impl From<DetectorError> for PipelineError {
    fn from(e: DetectorError) -> Self {
        match e {
            DetectorError::ModelUnavailable(msg) => PipelineError::ModelUnavailable(msg),
            DetectorError::InvalidInput(msg) => PipelineError::Decode(msg),
            DetectorError::InferenceFailed(msg) => PipelineError::InferenceFailed(msg),
        }
    }
}
