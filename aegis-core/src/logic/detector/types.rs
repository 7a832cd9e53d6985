//! Detector Types
//!
//! Data structures shared by detector implementations, the classifier
//! and the event log. No logic beyond trivial constructors.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_DETECTIONS};
use crate::logic::threat::{RiskLevel, ThreatTier};

// ============================================================================
// THRESHOLDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionThresholds {
    /// Minimum confidence to report
    pub confidence: f32,
    /// NMS IoU threshold
    pub iou: f32,
    /// Cap on detections per image
    pub max_detections: usize,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE_THRESHOLD,
            iou: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }
}

// ============================================================================
// DETECTIONS
// ============================================================================

/// Detector output before risk scoring.
/// `bbox` is `[x1, y1, x2, y2]` in original image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_name: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub width: i32,
    pub height: i32,
    pub cx: i32,
    pub cy: i32,
}

impl BoundingBox {
    /// Pixel coordinates are truncated towards zero
    pub fn from_corners(corners: [f32; 4]) -> Self {
        let [x1, y1, x2, y2] = corners.map(|v| v as i32);
        Self {
            x1,
            y1,
            x2,
            y2,
            width: x2 - x1,
            height: y2 - y1,
            cx: (x1 + x2) / 2,
            cy: (y1 + y2) / 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// One scored object in one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: usize,
    pub class_name: String,
    /// Rounded to 4 decimals
    pub confidence: f32,
    pub risk_level: RiskLevel,
    /// Tier this detection triggers on its own
    pub tier: ThreatTier,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}
