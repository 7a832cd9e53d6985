//! Startup - model loading and shared state assembly

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use aegis_core::logic::analytics::SnapshotOptions;
use aegis_core::logic::analyst::{AnalystClient, SitrepStore};
use aegis_core::logic::detector::{load_labels, Detector, DetectorError, ModelProfile, OnnxYoloDetector};
use aegis_core::logic::geo::ReverseGeocoder;
use aegis_core::logic::pipeline::{Pipeline, PipelineConfig};
use aegis_core::{Classifier, DetectionLog};

use crate::config::Config;
use crate::AppState;

/// Resolve the profile and load its weights
pub fn load_detector(config: &Config) -> (ModelProfile, Result<Arc<dyn Detector>, DetectorError>) {
    let (profile, model_path) = config.model_paths.resolve(config.model_profile);
    tracing::info!("Model profile: {} ({})", profile, model_path.display());

    let labels = match &config.labels_path {
        Some(path) => load_labels(path),
        None => Ok(profile.default_labels().iter().map(|s| s.to_string()).collect()),
    };

    let detector = labels
        .and_then(|labels| OnnxYoloDetector::load(&model_path, labels))
        .map(|d| Arc::new(d.with_input_size(config.model_input_size)) as Arc<dyn Detector>);

    (profile, detector)
}

/// Full startup: a missing model is fatal unless degraded mode is allowed
pub fn build_state(config: Config) -> anyhow::Result<AppState> {
    let (profile, detector) = load_detector(&config);

    let detector = match detector {
        Ok(detector) => Some(detector),
        Err(e) if config.allow_degraded => {
            tracing::error!("{}; starting in degraded mode", e);
            None
        }
        Err(e) => return Err(e).context("Failed to load detection model (set AEGIS_ALLOW_DEGRADED=true to start anyway)"),
    };

    assemble(config, profile, detector)
}

/// Wire the stores, pipeline and enrichment clients around a detector
pub fn assemble(config: Config, profile: ModelProfile, detector: Option<Arc<dyn Detector>>) -> anyhow::Result<AppState> {
    let log = Arc::new(
        DetectionLog::open(&config.log_path)
            .with_context(|| format!("Failed to open detection log {}", config.log_path.display()))?,
    );

    let sitreps = Arc::new(
        SitrepStore::open(&config.sitrep_path)
            .with_context(|| format!("Failed to open SITREP store {}", config.sitrep_path.display()))?,
    );

    let risk_table = profile
        .risk_table()
        .with_critical_confidence(config.critical_confidence);

    let pipeline = match detector {
        Some(detector) => {
            let pipeline_config = PipelineConfig {
                upload_dir: config.upload_dir.clone(),
                thresholds: config.thresholds,
                inference_timeout: Duration::from_secs(config.inference_timeout_secs),
            };
            let pipeline = Pipeline::new(detector, Classifier::new(risk_table.clone()), Arc::clone(&log), pipeline_config)
                .context("Failed to prepare upload directory")?;
            Some(Arc::new(pipeline))
        }
        None => {
            std::fs::create_dir_all(&config.upload_dir)
                .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;
            None
        }
    };

    let geocoder = if config.geocoding {
        match ReverseGeocoder::new(config.geocoder_url.clone()) {
            Ok(geocoder) => Some(Arc::new(geocoder)),
            Err(e) => {
                tracing::warn!("Geocoding disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let analyst = match config.llm.clone() {
        Some(llm) => match AnalystClient::new(llm) {
            Ok(client) => {
                tracing::info!("AI analyst enabled ({})", client.model());
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!("AI analyst disabled: {}", e);
                None
            }
        },
        None => {
            tracing::info!("AI analyst disabled (LLM_API_KEY not set)");
            None
        }
    };

    Ok(AppState {
        config: Arc::new(config),
        profile,
        pipeline,
        log,
        sitreps,
        geocoder,
        analyst,
        snapshot_options: Arc::new(SnapshotOptions::with_risk_table(risk_table)),
    })
}
