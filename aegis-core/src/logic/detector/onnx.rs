//! ONNX Runtime YOLO Detector
//!
//! Loads exported YOLOv8/YOLO11 weights and decodes the
//! `[1, 4 + classes, anchors]` output (transposed layout accepted too).
//! Plain resize to the square input, no letterbox.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::nms::non_max_suppression;
use super::types::{DetectionThresholds, RawDetection};
use super::{Detector, DetectorError};
use crate::constants::DEFAULT_MODEL_INPUT_SIZE;

pub struct OnnxYoloDetector {
    /// `run` needs exclusive access; held only for the call itself
    session: Mutex<Session>,
    labels: Vec<String>,
    input_size: u32,
    name: String,
}

impl OnnxYoloDetector {
    /// Fails fast when the weights are missing or the session cannot be built
    pub fn load(model_path: &Path, labels: Vec<String>) -> Result<Self, DetectorError> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(DetectorError::ModelUnavailable(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| DetectorError::ModelUnavailable(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| DetectorError::ModelUnavailable(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| DetectorError::ModelUnavailable(format!("Failed to load model: {}", e)))?;

        log::info!("ONNX model loaded successfully ({} classes)", labels.len());

        let name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_path.display().to_string());

        Ok(Self {
            session: Mutex::new(session),
            labels,
            input_size: DEFAULT_MODEL_INPUT_SIZE,
            name,
        })
    }

    /// Square input edge for weights not exported at 640
    pub fn with_input_size(mut self, input_size: u32) -> Self {
        self.input_size = input_size;
        self
    }

    /// RGB, NCHW, scaled to [0, 1]
    fn preprocess(&self, image: &DynamicImage) -> Array4<f32> {
        let size = self.input_size;
        let resized = image::imageops::resize(&image.to_rgb8(), size, size, FilterType::Triangle);

        let side = size as usize;
        let mut input = Array4::<f32>::zeros((1, 3, side, side));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                input[[0, c, y, x]] = pixel[c] as f32 / 255.0;
            }
        }
        input
    }

    fn class_name(&self, class_id: usize) -> String {
        self.labels
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }
}

impl Detector for OnnxYoloDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(
        &self,
        image: &DynamicImage,
        thresholds: &DetectionThresholds,
    ) -> Result<Vec<RawDetection>, DetectorError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(DetectorError::InvalidInput("Empty image".to_string()));
        }

        let input_tensor = Value::from_array(self.preprocess(image))
            .map_err(|e| DetectorError::InferenceFailed(format!("Tensor error: {}", e)))?;

        let (dims, data) = {
            let mut session = self.session.lock();

            let output_name = session
                .outputs
                .first()
                .map(|o| o.name.clone())
                .ok_or_else(|| DetectorError::InferenceFailed("No output defined".to_string()))?;

            let outputs = session
                .run(ort::inputs![input_tensor])
                .map_err(|e| DetectorError::InferenceFailed(format!("Inference failed: {}", e)))?;

            let output = outputs
                .get(&output_name)
                .ok_or_else(|| DetectorError::InferenceFailed("No output".to_string()))?;

            let (shape, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("Extract error: {}", e)))?;

            let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
            (dims, data.to_vec())
        };

        let layout = OutputLayout::from_dims(&dims, self.labels.len())?;
        let scale_x = width as f32 / self.input_size as f32;
        let scale_y = height as f32 / self.input_size as f32;

        let mut candidates = Vec::new();
        for anchor in 0..layout.anchors {
            let mut best_class = 0usize;
            let mut best_score = f32::MIN;
            for class_id in 0..layout.classes {
                let score = data[layout.index(anchor, 4 + class_id)];
                if score > best_score {
                    best_score = score;
                    best_class = class_id;
                }
            }
            if best_score < thresholds.confidence {
                continue;
            }

            let cx = data[layout.index(anchor, 0)];
            let cy = data[layout.index(anchor, 1)];
            let w = data[layout.index(anchor, 2)];
            let h = data[layout.index(anchor, 3)];

            let x1 = ((cx - w / 2.0) * scale_x).clamp(0.0, width as f32);
            let y1 = ((cy - h / 2.0) * scale_y).clamp(0.0, height as f32);
            let x2 = ((cx + w / 2.0) * scale_x).clamp(0.0, width as f32);
            let y2 = ((cy + h / 2.0) * scale_y).clamp(0.0, height as f32);

            candidates.push(RawDetection {
                class_name: self.class_name(best_class),
                confidence: best_score,
                bbox: [x1, y1, x2, y2],
            });
        }

        let mut detections = non_max_suppression(candidates, thresholds.iou);
        detections.truncate(thresholds.max_detections);

        log::debug!("{}: {} detections", self.name, detections.len());
        Ok(detections)
    }
}

// ============================================================================
// OUTPUT LAYOUT
// ============================================================================

/// Position of (anchor, channel) in the flat output buffer
#[derive(Debug, Clone, Copy, PartialEq)]
struct OutputLayout {
    anchors: usize,
    classes: usize,
    channels_first: bool,
}

impl OutputLayout {
    fn from_dims(dims: &[usize], label_count: usize) -> Result<Self, DetectorError> {
        let (a, b) = match dims {
            [1, a, b] => (*a, *b),
            [a, b] => (*a, *b),
            _ => {
                return Err(DetectorError::InferenceFailed(format!(
                    "Unexpected output shape: {:?}",
                    dims
                )))
            }
        };

        // [4 + nc, anchors] unless the first axis clearly holds anchors
        let channels_first = a == 4 + label_count || (b != 4 + label_count && a < b);
        let (channels, anchors) = if channels_first { (a, b) } else { (b, a) };

        if channels <= 4 {
            return Err(DetectorError::InferenceFailed(format!(
                "Output has no class channels: {:?}",
                dims
            )));
        }

        Ok(Self {
            anchors,
            classes: channels - 4,
            channels_first,
        })
    }

    fn index(&self, anchor: usize, channel: usize) -> usize {
        if self.channels_first {
            channel * self.anchors + anchor
        } else {
            anchor * (self.classes + 4) + channel
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_weights_is_model_unavailable() {
        let result = OnnxYoloDetector::load(Path::new("/nonexistent/weights.onnx"), vec![]);
        assert!(matches!(result, Err(DetectorError::ModelUnavailable(_))));
    }

    #[test]
    fn test_layout_channels_first() {
        let layout = OutputLayout::from_dims(&[1, 84, 8400], 80).unwrap();
        assert!(layout.channels_first);
        assert_eq!(layout.anchors, 8400);
        assert_eq!(layout.classes, 80);
        assert_eq!(layout.index(3, 2), 2 * 8400 + 3);
    }

    #[test]
    fn test_layout_transposed() {
        let layout = OutputLayout::from_dims(&[1, 8400, 24], 20).unwrap();
        assert!(!layout.channels_first);
        assert_eq!(layout.anchors, 8400);
        assert_eq!(layout.classes, 20);
        assert_eq!(layout.index(1, 5), 24 + 5);
    }

    #[test]
    fn test_layout_rejects_bad_shapes() {
        assert!(OutputLayout::from_dims(&[1, 2, 3, 4], 80).is_err());
        assert!(OutputLayout::from_dims(&[1, 4, 8400], 0).is_err());
    }
}
