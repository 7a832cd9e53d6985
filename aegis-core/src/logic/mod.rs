//! Logic Module - Detection pipeline and its collaborators
//!
//! ## Layout
//! - `detector/`  - model adapters (ONNX YOLO), profiles, NMS, annotation
//! - `threat/`    - tier classification over injected risk tables
//! - `telemetry/` - append-only detection log
//! - `analytics/` - dashboard aggregation
//! - `pipeline/`  - request orchestration
//! - `geo/`, `analyst/` - optional enrichment
//! - `retry`      - single-retry helper for outbound calls

pub mod detector;
pub mod threat;
pub mod telemetry;
pub mod analytics;
pub mod pipeline;
pub mod geo;
pub mod analyst;
pub mod retry;
