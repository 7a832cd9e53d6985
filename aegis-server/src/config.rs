//! Configuration module

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use aegis_core::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_CRITICAL_CONFIDENCE, DEFAULT_GEOCODER_URL,
    DEFAULT_INFERENCE_TIMEOUT_SECS, DEFAULT_IOU_THRESHOLD, DEFAULT_LLM_BASE_URL,
    DEFAULT_LLM_MAX_TOKENS, DEFAULT_LLM_MODEL, DEFAULT_LLM_TEMPERATURE, DEFAULT_MAX_DETECTIONS,
    DEFAULT_MODEL_INPUT_SIZE,
};
use aegis_core::logic::analyst::AnalystConfig;
use aegis_core::logic::detector::{DetectionThresholds, ModelPaths, ProfileSelection};

/// Request bodies above this are rejected with 413
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Requested model profile (`auto` picks from available weights)
    pub model_profile: ProfileSelection,

    /// Weight files per profile
    pub model_paths: ModelPaths,

    /// Optional label file overriding the profile's class names
    pub labels_path: Option<PathBuf>,

    /// Square input edge the weights were exported with
    pub model_input_size: u32,

    pub thresholds: DetectionThresholds,

    /// A critical-set class must exceed this to raise CRITICAL
    pub critical_confidence: f32,

    pub inference_timeout_secs: u64,

    /// Originals and annotated copies, served under /static/uploads
    pub upload_dir: PathBuf,

    /// Request body cap for uploads
    pub max_upload_bytes: usize,

    /// Append-only detection log (CSV)
    pub log_path: PathBuf,

    /// SITREP store (JSON)
    pub sitrep_path: PathBuf,

    /// Start without a model; /health and /detect answer 503
    pub allow_degraded: bool,

    /// Reverse geocode GPS fixes
    pub geocoding: bool,
    pub geocoder_url: String,

    /// `None` disables the analyst
    pub llm: Option<AnalystConfig>,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let model_profile = match env::var("AEGIS_MODEL_PROFILE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("AEGIS_MODEL_PROFILE: {}; using auto", e);
                ProfileSelection::Auto
            }),
            Err(_) => ProfileSelection::Auto,
        };

        let llm = env::var("LLM_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(|api_key| AnalystConfig {
                api_key,
                base_url: env_or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
                model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
                max_tokens: env_parse("LLM_MAX_TOKENS", DEFAULT_LLM_MAX_TOKENS),
                temperature: env_parse("LLM_TEMPERATURE", DEFAULT_LLM_TEMPERATURE),
            });

        Self {
            host: env_or("HOST", &defaults.host),
            port: env_parse("PORT", defaults.port),
            model_profile,
            model_paths: ModelPaths {
                military: env_path("AEGIS_MILITARY_MODEL", defaults.model_paths.military),
                aerial: env_path("AEGIS_AERIAL_MODEL", defaults.model_paths.aerial),
                general: env_path("AEGIS_GENERAL_MODEL", defaults.model_paths.general),
            },
            labels_path: env::var("AEGIS_LABELS_PATH").ok().filter(|p| !p.is_empty()).map(PathBuf::from),
            model_input_size: match env_parse("AEGIS_MODEL_INPUT_SIZE", defaults.model_input_size) {
                0 => {
                    tracing::warn!("AEGIS_MODEL_INPUT_SIZE must be positive; using {}", DEFAULT_MODEL_INPUT_SIZE);
                    DEFAULT_MODEL_INPUT_SIZE
                }
                size => size,
            },
            thresholds: DetectionThresholds {
                confidence: env_parse("AEGIS_CONFIDENCE", DEFAULT_CONFIDENCE_THRESHOLD),
                iou: env_parse("AEGIS_IOU", DEFAULT_IOU_THRESHOLD),
                max_detections: env_parse("AEGIS_MAX_DETECTIONS", DEFAULT_MAX_DETECTIONS),
            },
            critical_confidence: env_parse("AEGIS_CRITICAL_CONFIDENCE", DEFAULT_CRITICAL_CONFIDENCE),
            inference_timeout_secs: env_parse("AEGIS_INFERENCE_TIMEOUT_SECS", DEFAULT_INFERENCE_TIMEOUT_SECS),
            upload_dir: env_path("AEGIS_UPLOAD_DIR", defaults.upload_dir),
            max_upload_bytes: defaults.max_upload_bytes,
            log_path: env_path("AEGIS_LOG_PATH", defaults.log_path),
            sitrep_path: env_path("AEGIS_SITREP_PATH", defaults.sitrep_path),
            allow_degraded: env_parse("AEGIS_ALLOW_DEGRADED", defaults.allow_degraded),
            geocoding: env_parse("AEGIS_GEOCODING", defaults.geocoding),
            geocoder_url: env_or("AEGIS_GEOCODER_URL", &defaults.geocoder_url),
            llm,
            environment: env_or("ENVIRONMENT", &defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_profile: ProfileSelection::Auto,
            model_paths: ModelPaths::default(),
            labels_path: None,
            model_input_size: DEFAULT_MODEL_INPUT_SIZE,
            thresholds: DetectionThresholds::default(),
            critical_confidence: DEFAULT_CRITICAL_CONFIDENCE,
            inference_timeout_secs: DEFAULT_INFERENCE_TIMEOUT_SECS,
            upload_dir: PathBuf::from("static/uploads"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            log_path: PathBuf::from("logs/detections.csv"),
            sitrep_path: PathBuf::from("logs/sitreps.json"),
            allow_degraded: false,
            geocoding: true,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            llm: None,
            environment: "development".to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or(default)
}

/// Unparseable values fall back to the default with a warning
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
