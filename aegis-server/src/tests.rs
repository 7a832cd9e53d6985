//! Router tests: the full HTTP surface over a mock detector and temp storage

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use aegis_core::logic::analyst::SitrepEntry;
use aegis_core::logic::detector::{DetectionThresholds, Detector, DetectorError, ModelProfile, RawDetection};
use aegis_core::logic::telemetry::HEADERS;

use crate::config::Config;
use crate::{bootstrap, create_router, AppState};

// ============================================================================
// FIXTURES
// ============================================================================

struct FixedDetector(Vec<RawDetection>);

impl Detector for FixedDetector {
    fn name(&self) -> &str {
        "fixed"
    }

    fn detect(&self, _image: &DynamicImage, _t: &DetectionThresholds) -> Result<Vec<RawDetection>, DetectorError> {
        Ok(self.0.clone())
    }
}

fn convoy() -> Arc<dyn Detector> {
    Arc::new(FixedDetector(vec![
        RawDetection {
            class_name: "truck".to_string(),
            confidence: 0.89,
            bbox: [2.0, 2.0, 30.0, 20.0],
        },
        RawDetection {
            class_name: "person".to_string(),
            confidence: 0.76,
            bbox: [35.0, 5.0, 45.0, 30.0],
        },
    ]))
}

fn state_with(dir: &TempDir, detector: Option<Arc<dyn Detector>>, tweak: impl FnOnce(&mut Config)) -> AppState {
    let mut config = Config {
        upload_dir: dir.path().join("uploads"),
        log_path: dir.path().join("logs").join("detections.csv"),
        sitrep_path: dir.path().join("logs").join("sitreps.json"),
        geocoding: false,
        llm: None,
        ..Config::default()
    };
    tweak(&mut config);
    bootstrap::assemble(config, ModelProfile::General, detector).unwrap()
}

fn app(dir: &TempDir) -> (AppState, Router) {
    let state = state_with(dir, Some(convoy()), |_| {});
    (state.clone(), create_router(state))
}

fn png_bytes() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(64, 48))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Real JPEG with an Exif APP1 segment carrying a GPS fix. Coordinates in
/// ten-thousandths of a degree (N/E), altitude in metres.
fn geotagged_jpeg(lat_e4: u32, lon_e4: u32, alt_m: u32) -> Vec<u8> {
    const GPS_IFD: u32 = 26;
    const LAT_DATA: u32 = 104;
    const LON_DATA: u32 = 128;
    const ALT_DATA: u32 = 152;

    let mut tiff = Vec::new();
    let u16le = |out: &mut Vec<u8>, v: u16| out.extend_from_slice(&v.to_le_bytes());
    let u32le = |out: &mut Vec<u8>, v: u32| out.extend_from_slice(&v.to_le_bytes());

    tiff.extend_from_slice(b"II");
    u16le(&mut tiff, 42);
    u32le(&mut tiff, 8);

    // IFD0 holds only the GPS pointer
    u16le(&mut tiff, 1);
    u16le(&mut tiff, 0x8825);
    u16le(&mut tiff, 4);
    u32le(&mut tiff, 1);
    u32le(&mut tiff, GPS_IFD);
    u32le(&mut tiff, 0);

    let entries: [(u16, u16, u32, [u8; 4]); 6] = [
        (1, 2, 2, [b'N', 0, 0, 0]),
        (2, 5, 3, LAT_DATA.to_le_bytes()),
        (3, 2, 2, [b'E', 0, 0, 0]),
        (4, 5, 3, LON_DATA.to_le_bytes()),
        (5, 1, 1, [0, 0, 0, 0]),
        (6, 5, 1, ALT_DATA.to_le_bytes()),
    ];
    u16le(&mut tiff, entries.len() as u16);
    for (tag, kind, count, value) in entries {
        u16le(&mut tiff, tag);
        u16le(&mut tiff, kind);
        u32le(&mut tiff, count);
        tiff.extend_from_slice(&value);
    }
    u32le(&mut tiff, 0);
    assert_eq!(tiff.len() as u32, LAT_DATA);

    let rationals = [(lat_e4, 10_000), (0, 1), (0, 1), (lon_e4, 10_000), (0, 1), (0, 1), (alt_m, 1)];
    for (num, den) in rationals {
        u32le(&mut tiff, num);
        u32le(&mut tiff, den);
    }

    let mut jpeg = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(64, 48))
        .write_to(&mut jpeg, ImageFormat::Jpeg)
        .unwrap();
    let jpeg = jpeg.into_inner();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    // SOI, then APP1, then the encoder's own segments
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

const BOUNDARY: &str = "aegis-test-boundary";

fn multipart(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/detect")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

// ============================================================================
// HEALTH
// ============================================================================

#[tokio::test]
async fn test_health_reports_ready_model() {
    let dir = TempDir::new().unwrap();
    let (_, app) = app(&dir);

    let (status, body) = send_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_ready"], true);
    assert_eq!(body["profile"], "general");
    assert_eq!(body["detector"], "fixed");
    assert_eq!(body["stalled_inferences"], 0);
    assert_eq!(body["analyst_enabled"], false);
}

#[tokio::test]
async fn test_degraded_mode_answers_503() {
    let dir = TempDir::new().unwrap();
    let app = create_router(state_with(&dir, None, |_| {}));

    let (status, body) = send_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["model_ready"], false);

    let (status, body) = send_json(&app, multipart("image", "scene.png", &png_bytes())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], 503);
}

// ============================================================================
// DETECT
// ============================================================================

#[tokio::test]
async fn test_detect_returns_scored_scan() {
    let dir = TempDir::new().unwrap();
    let (_, app) = app(&dir);

    let (status, body) = send_json(&app, multipart("image", "convoy.png", &png_bytes())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["threat"]["threat_level"], "HIGH");
    assert_eq!(body["threat"]["stats"]["class_counts"]["truck"], 1);
    assert_eq!(body["threat"]["stats"]["class_counts"]["person"], 1);
    assert_eq!(body["threat"]["high_risk_hits"], serde_json::json!(["truck"]));
    assert_eq!(body["detections"][0]["class_name"], "truck");
    assert_eq!(body["detections"][0]["box"]["x1"], 2);
    assert_eq!(body["image_size"]["width"], 64);
    assert_eq!(body["geo"], Value::Null);
    assert_eq!(body["log_warning"], Value::Null);
    assert_eq!(body["analyst_enabled"], false);
    assert_eq!(body["sitrep"]["success"], false);

    let scan_id = body["scan_id"].as_str().unwrap();
    assert_eq!(scan_id.len(), 8);
    assert_eq!(body["original_path"], format!("/static/uploads/{}_convoy.png", scan_id));

    // Annotated copy is served
    let annotated = body["annotated_path"].as_str().unwrap();
    assert_eq!(annotated, format!("/static/uploads/annotated_{}_convoy.jpg", scan_id));
    let (status, _, bytes) = send(&app, get(annotated)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(image::load_from_memory(&bytes).is_ok());
}

#[tokio::test]
async fn test_detect_reports_gps_from_exif() {
    let dir = TempDir::new().unwrap();
    let (_, app) = app(&dir);

    let photo = geotagged_jpeg(286_129, 772_295, 216);
    let (status, body) = send_json(&app, multipart("image", "patrol.jpg", &photo)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["threat"]["threat_level"], "HIGH");

    let geo = &body["geo"];
    assert_eq!(geo["latitude"], 28.6129);
    assert_eq!(geo["longitude"], 77.2295);
    assert_eq!(geo["altitude"], 216.0);
    let link = geo["maps_link"].as_str().unwrap();
    assert!(link.contains("28.6129"), "{}", link);
    assert!(link.contains("77.2295"), "{}", link);
    // geocoding is off in this harness
    assert_eq!(geo["geocode_status"], "not_attempted");
    assert_eq!(geo["location_name"], Value::Null);
}

#[tokio::test]
async fn test_detect_rejects_bad_requests() {
    let dir = TempDir::new().unwrap();
    let (_, app) = app(&dir);

    let (status, body) = send_json(&app, multipart("file", "scene.png", &png_bytes())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send_json(&app, multipart("image", "", &png_bytes())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&app, multipart("image", "notes.txt", b"hello")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, body) = send_json(&app, multipart("image", "broken.jpg", b"not a jpeg")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);

    // Nothing was logged by any of the above
    let (_, body) = send_json(&app, get("/logs")).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_detect_rejects_oversized_upload() {
    let dir = TempDir::new().unwrap();
    let app = create_router(state_with(&dir, Some(convoy()), |c| c.max_upload_bytes = 1024));

    let (status, body) = send_json(&app, multipart("image", "big.png", &vec![0u8; 8192])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["status"], 413);
}

// ============================================================================
// LOGS / ANALYTICS / EXPORT
// ============================================================================

#[tokio::test]
async fn test_logs_dashboard_and_export_follow_scans() {
    let dir = TempDir::new().unwrap();
    let (_, app) = app(&dir);

    for name in ["a.png", "b.png"] {
        let (status, _) = send_json(&app, multipart("image", name, &png_bytes())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send_json(&app, get("/logs?limit=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["logs"][0]["threat_level"], "HIGH");

    let (status, body) = send_json(&app, get("/api/dashboard-data")).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["summary"]["total_scans"], 2);
    assert_eq!(data["summary"]["total_detections"], 4);
    assert_eq!(data["threat_distribution"]["HIGH"], 2);
    assert_eq!(data["confidence_histogram"].as_array().unwrap().len(), 10);
    assert_eq!(data["hourly_heatmap"].as_array().unwrap().len(), 7);

    let (status, headers, body) = send(&app, get("/api/export-csv")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("aegis_detections.csv"));
    let text = String::from_utf8(body).unwrap();
    assert_eq!(text.lines().next().unwrap(), HEADERS.join(","));
    assert_eq!(text.lines().count(), 5);
}

#[tokio::test]
async fn test_empty_store_endpoints() {
    let dir = TempDir::new().unwrap();
    let (_, app) = app(&dir);

    let (_, body) = send_json(&app, get("/api/dashboard-data")).await;
    assert_eq!(body["data"]["summary"]["total_scans"], 0);
    assert_eq!(body["data"]["summary"]["avg_confidence"], 0.0);

    let (status, _, body) = send(&app, get("/api/export-csv")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap().trim_end(), HEADERS.join(","));
}

// ============================================================================
// SITREP / CHAT
// ============================================================================

#[tokio::test]
async fn test_sitrep_lookup() {
    let dir = TempDir::new().unwrap();
    let (state, app) = app(&dir);

    let (status, body) = send_json(&app, get("/api/sitrep/deadbeef")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    state
        .sitreps
        .insert(SitrepEntry {
            scan_id: "deadbeef".to_string(),
            timestamp: Utc::now(),
            detection_context: "IMAGE SCAN ANALYSIS".to_string(),
            sitrep: "One truck, HIGH.".to_string(),
            model: "test-model".to_string(),
            tokens: 12,
            chat_history: Vec::new(),
        })
        .unwrap();

    let (status, body) = send_json(&app, get("/api/sitrep/deadbeef")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sitrep"], "One truck, HIGH.");
    assert_eq!(body["tokens"], 12);
    assert_eq!(body["chat_history"], serde_json::json!([]));
}

#[tokio::test]
async fn test_chat_validation_and_disabled_analyst() {
    let dir = TempDir::new().unwrap();
    let (_, app) = app(&dir);

    let (status, _) = send_json(&app, post_json("/api/chat", r#"{"scan_id": "abc"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&app, post_json("/api/chat", "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(&app, post_json("/api/chat", r#"{"scan_id": "abc", "message": "how many?"}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}
