//! Image detection handler

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};

use aegis_core::logic::analyst::{build_detection_context, SitrepResult};
use aegis_core::logic::geo::{self, GeoTag};
use aegis_core::{ScanOutcome, Upload};

use crate::models::{upload_url, DetectResponse};
use crate::{AppError, AppResult, AppState};

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// POST /detect
pub async fn detect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<DetectResponse>> {
    let upload = read_upload(multipart).await?;

    let pipeline = state
        .pipeline
        .clone()
        .ok_or_else(|| AppError::ModelUnavailable("Detector failed to load at startup".to_string()))?;

    tracing::debug!("Scanning {} ({} bytes)", upload.original_filename, upload.bytes.len());
    let outcome = tokio::task::spawn_blocking(move || pipeline.run(upload)).await??;

    let geo = enrich_geo(&state, &outcome).await;
    let sitrep = enrich_sitrep(&state, &outcome).await;

    Ok(Json(DetectResponse {
        success: true,
        annotated_path: outcome.annotated_file.as_deref().map(upload_url),
        original_path: outcome.original_file.as_deref().map(upload_url),
        scan_id: outcome.scan_id,
        detections: outcome.detections,
        threat: outcome.threat,
        inference_ms: outcome.inference_ms,
        image_size: outcome.image_size,
        geo,
        sitrep,
        analyst_enabled: state.analyst.is_some(),
        log_warning: outcome.log_warning,
    }))
}

async fn read_upload(mut multipart: Multipart) -> AppResult<Upload> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::trim).unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(AppError::BadRequest("No file selected".to_string()));
        }

        let bytes = field.bytes().await?;
        return Ok(Upload::new(filename, bytes.to_vec()));
    }

    Err(AppError::BadRequest(format!("No '{}' field in request", IMAGE_FIELD)))
}

async fn enrich_geo(state: &AppState, outcome: &ScanOutcome) -> Option<GeoTag> {
    let fix = outcome.gps.as_ref()?;
    Some(geo::resolve(fix, state.geocoder.as_deref()).await)
}

/// Failures are reported in the result; the scan itself already succeeded
async fn enrich_sitrep(state: &AppState, outcome: &ScanOutcome) -> SitrepResult {
    let Some(analyst) = state.analyst.as_ref() else {
        return SitrepResult::disabled();
    };

    let context = build_detection_context(
        &outcome.detections,
        &outcome.threat,
        outcome.image_size,
        outcome.inference_ms,
    );
    let result = analyst.generate_sitrep(&context).await;

    if result.success {
        let sitreps = Arc::clone(&state.sitreps);
        let scan_id = outcome.scan_id.clone();
        let stored = result.clone();
        let saved = tokio::task::spawn_blocking(move || sitreps.save(&scan_id, &context, &stored)).await;
        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed to store SITREP for {}: {}", outcome.scan_id, e),
            Err(e) => tracing::warn!("SITREP store task failed: {}", e),
        }
    }

    result
}
