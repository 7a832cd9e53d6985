//! Analyst Prompt Context
//!
//! Turns one scan into the compact text block the analyst reads.

use std::fmt::Write;

use crate::logic::detector::{Detection, ImageSize};
use crate::logic::threat::ThreatAssessment;

pub const SYSTEM_PROMPT: &str = "You are the tactical analyst of AEGIS, an image surveillance system. \
You read object detection results (class names, confidence scores, bounding boxes, risk levels, \
threat tier) and turn them into intelligence for a human operator.

SITREP format:
- One-sentence executive summary first.
- Detected objects grouped by risk, high before medium before low, with confidence and position where useful.
- A recommendation when the threat tier is ELEVATED or above.
- Under 200 words, present tense, direct and factual.

Follow-up questions: cite specific detections, state when the data is insufficient, and never \
speculate beyond the scan. You see exactly one image and no history unless it is provided.";

/// Horizontal and vertical thirds of the frame
fn position(det: &Detection, size: ImageSize) -> String {
    let (w, h) = (size.width.max(1) as f32, size.height.max(1) as f32);
    let (cx, cy) = (det.bbox.cx as f32, det.bbox.cy as f32);

    let h_pos = if cx < w * 0.33 {
        "left"
    } else if cx > w * 0.67 {
        "right"
    } else {
        "center"
    };
    let v_pos = if cy < h * 0.33 {
        "top"
    } else if cy > h * 0.67 {
        "bottom"
    } else {
        "middle"
    };

    if v_pos == "middle" && h_pos == "center" {
        "center".to_string()
    } else {
        format!("{}-{}", v_pos, h_pos)
    }
}

pub fn build_detection_context(
    detections: &[Detection],
    threat: &ThreatAssessment,
    image_size: ImageSize,
    inference_ms: f64,
) -> String {
    let mut out = String::new();
    let stats = &threat.stats;

    // Writing to a String cannot fail
    let _ = writeln!(out, "IMAGE SCAN ANALYSIS");
    let _ = writeln!(out, "Resolution: {}x{} pixels", image_size.width, image_size.height);
    let _ = writeln!(out, "Inference time: {}ms", inference_ms);
    let _ = writeln!(out);
    let _ = writeln!(out, "THREAT ASSESSMENT:");
    let _ = writeln!(out, "  Level: {}", threat.threat_level);
    let _ = writeln!(out, "  Label: {}", threat.label);
    let _ = writeln!(out, "  Description: {}", threat.description);
    let _ = writeln!(out, "  Total detections: {}", stats.total);
    let _ = writeln!(out, "  High-risk: {}", stats.high_risk);
    let _ = writeln!(out, "  Medium-risk: {}", stats.medium_risk);
    let _ = writeln!(out, "  Low-risk: {}", stats.low_risk);
    let _ = writeln!(out);

    if detections.is_empty() {
        let _ = write!(out, "DETECTED OBJECTS: None");
        return out;
    }

    let _ = write!(out, "DETECTED OBJECTS ({} total):", detections.len());
    for (i, det) in detections.iter().enumerate() {
        let _ = write!(
            out,
            "\n  {}. {} [{} RISK]\n     Confidence: {:.1}%\n     Position: {} of frame\n     Size: {}x{} pixels",
            i + 1,
            det.class_name.to_uppercase(),
            det.risk_level.as_str().to_uppercase(),
            det.confidence * 100.0,
            position(det, image_size),
            det.bbox.width,
            det.bbox.height,
        );
    }
    out
}
