//! Non-Maximum Suppression
//!
//! Class-aware: a box only suppresses boxes of the same class.

use super::types::RawDetection;

/// Keep the most confident box of each overlapping same-class cluster.
/// Output is sorted by confidence descending.
pub fn non_max_suppression(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawDetection> = Vec::with_capacity(detections.len());
    while !detections.is_empty() {
        let best = detections.remove(0);
        detections.retain(|det| det.class_name != best.class_name || iou(&best.bbox, &det.bbox) < iou_threshold);
        kept.push(best);
    }
    kept
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;

    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}
