//! Scan Orchestrator
//!
//! Drives one upload through the stages. Inference runs on its own worker
//! thread so a stuck model call is cut off at `inference_timeout`; the
//! worker is abandoned, never joined. While an abandoned worker is still
//! running, new scans fail fast instead of queueing more threads behind it.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chrono::Utc;
use image::DynamicImage;

use super::types::{PipelineConfig, ScanOutcome, ScanStage, Upload};
use super::PipelineError;
use crate::constants::{ALLOWED_EXTENSIONS, MAX_FILENAME_STEM, MAX_STALLED_INFERENCES};
use crate::logic::detector::{annotate, Detection, Detector, DetectorError, ImageSize, RawDetection};
use crate::logic::geo::{extract_gps, GpsFix};
use crate::logic::telemetry::{DetectionLog, ScanEntry};
use crate::logic::threat::Classifier;

type InferenceResult = (Result<Vec<RawDetection>, DetectorError>, f64);

// Worker states, settled once by whichever side gets there first
const WORKER_RUNNING: u8 = 0;
const WORKER_DONE: u8 = 1;
const WORKER_ABANDONED: u8 = 2;

pub struct Pipeline {
    detector: Arc<dyn Detector>,
    classifier: Classifier,
    log: Arc<DetectionLog>,
    config: PipelineConfig,
    /// Timed-out workers that have not returned yet
    stalled: Arc<AtomicUsize>,
}

impl Pipeline {
    pub fn new(
        detector: Arc<dyn Detector>,
        classifier: Classifier,
        log: Arc<DetectionLog>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        fs::create_dir_all(&config.upload_dir).map_err(|e| {
            PipelineError::Storage(format!("{}: {}", config.upload_dir.display(), e))
        })?;

        log::info!(
            "Pipeline ready: detector={}, uploads={}, timeout={:?}",
            detector.name(),
            config.upload_dir.display(),
            config.inference_timeout
        );

        Ok(Self {
            detector,
            classifier,
            log,
            config,
            stalled: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    /// Inference workers abandoned after a timeout and still running
    pub fn stalled_inferences(&self) -> usize {
        self.stalled.load(Ordering::SeqCst)
    }

    /// Process one upload end to end. Blocking.
    pub fn run(&self, upload: Upload) -> Result<ScanOutcome, PipelineError> {
        let scan_id = new_scan_id();
        let mut stage = ScanStage::Received;
        let timestamp = Utc::now();

        let result = self.run_stages(&scan_id, &mut stage, timestamp, upload);
        if let Err(e) = &result {
            log::warn!("[{}] {} -> {}: {}", scan_id, stage, ScanStage::Failed, e);
        }
        result
    }

    fn run_stages(
        &self,
        scan_id: &str,
        stage: &mut ScanStage,
        timestamp: chrono::DateTime<Utc>,
        upload: Upload,
    ) -> Result<ScanOutcome, PipelineError> {
        // DECODING
        advance(scan_id, stage, ScanStage::Decoding);
        let (stem, ext) = sanitize_filename(&upload.original_filename)?;
        let image_filename = format!("{}_{}.{}", scan_id, stem, ext);
        let image = image::load_from_memory(&upload.bytes).map_err(|e| PipelineError::Decode(e.to_string()))?;
        let image_size = ImageSize {
            width: image.width(),
            height: image.height(),
        };
        let gps = read_gps(scan_id, &upload.bytes);

        // DETECTING
        advance(scan_id, stage, ScanStage::Detecting);
        let image = Arc::new(image);
        let (raw, inference_ms) = self.infer(Arc::clone(&image))?;

        // CLASSIFYING
        advance(scan_id, stage, ScanStage::Classifying);
        let detections = self.classifier.score(raw);
        let threat = self.classifier.assess(&detections);

        let original_file = self.store_original(&image_filename, &upload.bytes);
        let annotated_file = self.store_annotated(&image_filename, &image, &detections);

        // LOGGING
        advance(scan_id, stage, ScanStage::Logging);
        let entry = ScanEntry {
            timestamp,
            image_filename: &image_filename,
            assessment: &threat,
            detections: &detections,
            inference_ms,
        };
        let log_warning = match self.log.append_scan(&entry) {
            Ok(_) => None,
            Err(e) => {
                log::error!("[{}] Detection log write failed: {}", scan_id, e);
                Some(format!("Detection log write failed: {}", e))
            }
        };

        // RESPONDING
        advance(scan_id, stage, ScanStage::Responding);
        log::info!(
            "[{}] {} -> {} ({} detections, {:.1}ms)",
            scan_id,
            image_filename,
            threat.threat_level,
            detections.len(),
            inference_ms
        );

        Ok(ScanOutcome {
            scan_id: scan_id.to_string(),
            image_filename,
            detections,
            threat,
            original_file,
            annotated_file,
            inference_ms,
            image_size,
            gps,
            log_warning,
        })
    }

    /// Run the detector on a worker thread bounded by the configured timeout
    fn infer(&self, image: Arc<DynamicImage>) -> Result<(Vec<RawDetection>, f64), PipelineError> {
        let stalled = self.stalled.load(Ordering::SeqCst);
        if stalled >= MAX_STALLED_INFERENCES {
            return Err(PipelineError::InferenceFailed(format!(
                "model busy: {} timed-out inference(s) still running",
                stalled
            )));
        }

        let (tx, rx) = mpsc::channel::<InferenceResult>();
        let detector = Arc::clone(&self.detector);
        let thresholds = self.config.thresholds;
        let state = Arc::new(AtomicU8::new(WORKER_RUNNING));
        let guard = WorkerGuard {
            state: Arc::clone(&state),
            stalled: Arc::clone(&self.stalled),
        };

        thread::Builder::new()
            .name("aegis-inference".to_string())
            .spawn(move || {
                let started = Instant::now();
                let result = detector.detect(&image, &thresholds);
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                drop(image);
                drop(guard);
                // Receiver is gone after a timeout
                let _ = tx.send((result, elapsed_ms));
            })
            .map_err(|e| PipelineError::InferenceFailed(format!("Failed to spawn inference worker: {}", e)))?;

        match rx.recv_timeout(self.config.inference_timeout) {
            Ok((result, elapsed_ms)) => {
                let raw = result?;
                Ok((raw, (elapsed_ms * 10.0).round() / 10.0))
            }
            Err(RecvTimeoutError::Timeout) => {
                // Count first so the worker's decrement can never run ahead of it
                self.stalled.fetch_add(1, Ordering::SeqCst);
                let abandoned = state.compare_exchange(
                    WORKER_RUNNING,
                    WORKER_ABANDONED,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                if abandoned.is_err() {
                    // Finished in the gap; nothing left running
                    self.stalled.fetch_sub(1, Ordering::SeqCst);
                }
                Err(PipelineError::InferenceTimeout(self.config.inference_timeout.as_secs()))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(PipelineError::InferenceFailed("Inference worker terminated".to_string()))
            }
        }
    }

    fn store_original(&self, image_filename: &str, bytes: &[u8]) -> Option<String> {
        let path = self.config.upload_dir.join(image_filename);
        match fs::write(&path, bytes) {
            Ok(()) => Some(image_filename.to_string()),
            Err(e) => {
                log::warn!("Failed to store upload {}: {}", path.display(), e);
                None
            }
        }
    }

    fn store_annotated(
        &self,
        image_filename: &str,
        image: &DynamicImage,
        detections: &[Detection],
    ) -> Option<String> {
        let stem = Path::new(image_filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| image_filename.to_string());
        let name = format!("annotated_{}.jpg", stem);
        let path = self.config.upload_dir.join(&name);

        let canvas = annotate::render(image, detections);
        match annotate::save_jpeg(&canvas, &path) {
            Ok(()) => Some(name),
            Err(e) => {
                log::warn!("Failed to write annotated image {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Settles the worker on exit, panics included, and releases its stalled
/// slot if the caller already gave up on it
struct WorkerGuard {
    state: Arc<AtomicU8>,
    stalled: Arc<AtomicUsize>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let settled = self
            .state
            .compare_exchange(WORKER_RUNNING, WORKER_DONE, Ordering::SeqCst, Ordering::SeqCst);
        if settled.is_err() {
            self.stalled.fetch_sub(1, Ordering::SeqCst);
            log::info!("Abandoned inference worker finished");
        }
    }
}

fn advance(scan_id: &str, stage: &mut ScanStage, next: ScanStage) {
    log::debug!("[{}] {} -> {}", scan_id, stage, next);
    *stage = next;
}

fn new_scan_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// GPS is best effort; a corrupt block is logged and ignored
fn read_gps(scan_id: &str, bytes: &[u8]) -> Option<GpsFix> {
    match extract_gps(bytes) {
        Ok(fix) => fix,
        Err(e) => {
            log::warn!("[{}] {}", scan_id, e);
            None
        }
    }
}

/// Split an upload name into a safe stem and a lower-case allowed extension
pub fn sanitize_filename(filename: &str) -> Result<(String, String), PipelineError> {
    let base = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(filename).trim();
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, ext.to_ascii_lowercase()),
        None => return Err(PipelineError::UnsupportedFile(format!("{} has no extension", base))),
    };

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(PipelineError::UnsupportedFile(format!(
            ".{} (allowed: {})",
            ext,
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let mut safe: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(MAX_FILENAME_STEM)
        .collect();
    if safe.trim_matches('_').is_empty() {
        safe = "upload".to_string();
    }

    Ok((safe, ext))
}
