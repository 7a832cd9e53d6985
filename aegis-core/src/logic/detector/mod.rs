//! Detector Module
//!
//! Object detection adapter. The rest of the crate only sees the
//! `Detector` trait, so the ONNX backend can be swapped for a mock in tests.
//!
//! ## Structure
//! - `types`: Detection, BoundingBox, thresholds
//! - `profile`: Model profiles, label lists, startup resolution
//! - `onnx`: ONNX Runtime YOLO implementation
//! - `nms`: Class-aware non-maximum suppression
//! - `annotate`: Draws risk-coloured boxes on a copy of the image

use image::DynamicImage;

pub mod types;
pub mod profile;
pub mod onnx;
pub mod nms;
pub mod annotate;

pub use types::{BoundingBox, Detection, DetectionThresholds, ImageSize, RawDetection};
pub use profile::{load_labels, ModelPaths, ModelProfile, ProfileSelection};
pub use onnx::OnnxYoloDetector;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum DetectorError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

// ============================================================================
// TRAIT
// ============================================================================

/// A loaded object detector.
///
/// Implementations are shared read-only across requests; any interior
/// mutable state (e.g. an inference session) must be synchronised internally.
pub trait Detector: Send + Sync {
    /// Human-readable model identifier
    fn name(&self) -> &str;

    /// Returned detections all have confidence >= `thresholds.confidence`
    /// and survived class-aware NMS. An empty list is a valid result.
    fn detect(
        &self,
        image: &DynamicImage,
        thresholds: &DetectionThresholds,
    ) -> Result<Vec<RawDetection>, DetectorError>;
}
