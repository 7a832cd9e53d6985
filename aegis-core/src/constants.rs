//! Central Configuration Constants
//!
//! Single source of truth for detection, logging and dashboard defaults.
//! The server reads overrides from the environment; everything else uses these.

/// Minimum confidence for a detection to be reported
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// IoU above which two same-class boxes are considered duplicates
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// Cap on detections per image
pub const DEFAULT_MAX_DETECTIONS: usize = 100;

/// A critical-set class must exceed this confidence to raise CRITICAL
pub const DEFAULT_CRITICAL_CONFIDENCE: f32 = 0.80;

/// Upper bound on a single inference call (seconds)
pub const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 30;

/// Timed-out inference workers tolerated before scans fail fast
pub const MAX_STALLED_INFERENCES: usize = 1;

/// Square input edge expected by the exported YOLO models
pub const DEFAULT_MODEL_INPUT_SIZE: u32 = 640;

/// JPEG quality for annotated output
pub const ANNOTATED_JPEG_QUALITY: u8 = 92;

/// Upload extensions accepted by `/detect`
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff"];

/// Longest filename stem kept from an upload
pub const MAX_FILENAME_STEM: usize = 40;

/// Timestamp layout used in the detection log
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================
// Dashboard
// ============================================

pub const RECENT_LOGS_LIMIT: usize = 50;
pub const DASHBOARD_RECENT_ROWS: usize = 25;
pub const DASHBOARD_TOP_CLASSES: usize = 10;
pub const DASHBOARD_TRAILING_DAYS: usize = 30;
pub const CONFIDENCE_BINS: usize = 10;

// ============================================
// Enrichment
// ============================================

/// Delay before the single retry of an outbound call
pub const ENRICHMENT_RETRY_BACKOFF_MS: u64 = 500;

/// Timeout for geocoding / LLM HTTP calls (seconds)
pub const ENRICHMENT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Public Nominatim endpoint
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// User agent sent to the geocoder (Nominatim rejects anonymous clients)
pub const GEOCODER_USER_AGENT: &str = "aegis_geo_intel_v2";

/// SITREPs kept in the store
pub const SITREP_KEEP_LAST: usize = 100;

// ============================================
// Analyst (OpenAI-compatible chat completions)
// ============================================

pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_LLM_MODEL: &str = "meta-llama/llama-3.2-3b-instruct:free";
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "AEGIS";
