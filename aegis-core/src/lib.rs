//! AEGIS Core - Detection, Threat Scoring & Analytics
//!
//! Everything the HTTP server needs to turn an uploaded image into a scored,
//! logged scan. The server crate only adds transport and configuration.
//!
//! ## Structure
//! - `logic::detector`  - Detector trait, ONNX YOLO engine, model profiles, annotation
//! - `logic::threat`    - Risk tables and tier classification
//! - `logic::telemetry` - Append-only CSV detection log + export
//! - `logic::analytics` - Dashboard snapshot over the detection log
//! - `logic::pipeline`  - Per-request orchestration (decode → detect → classify → log)
//! - `logic::geo`       - EXIF GPS extraction and reverse geocoding
//! - `logic::analyst`   - SITREP generation, chat and SITREP storage

pub mod constants;
pub mod logic;

pub use logic::detector::{Detection, Detector, DetectorError, ModelProfile, RawDetection};
pub use logic::pipeline::{Pipeline, PipelineError, ScanOutcome, Upload};
pub use logic::telemetry::{DetectionLog, LogRecord};
pub use logic::threat::{Classifier, RiskTable, ThreatAssessment, ThreatTier};
