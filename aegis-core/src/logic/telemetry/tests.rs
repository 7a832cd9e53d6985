use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::tempdir;

use super::*;
use crate::logic::detector::{Detection, RawDetection};
use crate::logic::threat::{Classifier, RiskLevel, RiskTable, ThreatAssessment, ThreatTier};

fn scored(classes: &[(&str, f32)]) -> (Vec<Detection>, ThreatAssessment) {
    let classifier = Classifier::new(RiskTable::general());
    let raw = classes
        .iter()
        .enumerate()
        .map(|(i, (name, conf))| RawDetection {
            class_name: name.to_string(),
            confidence: *conf,
            bbox: [i as f32 * 10.0, 5.0, i as f32 * 10.0 + 40.0, 65.0],
        })
        .collect();
    let detections = classifier.score(raw);
    let assessment = classifier.assess(&detections);
    (detections, assessment)
}

fn append(log: &DetectionLog, filename: &str, classes: &[(&str, f32)]) -> usize {
    let (detections, assessment) = scored(classes);
    let entry = ScanEntry {
        timestamp: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
        image_filename: filename,
        assessment: &assessment,
        detections: &detections,
        inference_ms: 42.5,
    };
    log.append_scan(&entry).unwrap()
}

#[test]
fn test_header_written_once() {
    let dir = tempdir().unwrap();
    let log = DetectionLog::open(dir.path().join("logs").join("detections.csv")).unwrap();

    append(&log, "a.jpg", &[("truck", 0.9)]);
    append(&log, "b.jpg", &[("person", 0.8), ("car", 0.7)]);

    let content = std::fs::read_to_string(log.path()).unwrap();
    let header = HEADERS.join(",");
    assert_eq!(content.matches(&header).count(), 1);
    assert!(content.starts_with(&header));
    assert_eq!(content.lines().count(), 4);
}

#[test]
fn test_rows_carry_scan_fields() {
    let dir = tempdir().unwrap();
    let log = DetectionLog::open(dir.path().join("detections.csv")).unwrap();

    assert_eq!(append(&log, "convoy.jpg", &[("truck", 0.89), ("person", 0.76)]), 2);

    let records = log.read_all().unwrap();
    assert_eq!(records.len(), 2);
    let truck = &records[0];
    assert_eq!(truck.image_filename, "convoy.jpg");
    assert_eq!(truck.threat_level, ThreatTier::High);
    assert_eq!(truck.total_detections, 2);
    assert_eq!(truck.high_risk_count, 1);
    assert_eq!(truck.class_name.as_deref(), Some("truck"));
    assert_eq!(truck.confidence, Some(0.89));
    assert_eq!(truck.risk_level, Some(RiskLevel::High));
    assert_eq!((truck.box_x1, truck.box_y2), (0, 65));
    assert_eq!(truck.inference_ms, 42.5);
    assert_eq!(
        truck.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        "2025-03-14 09:26:53"
    );
}

#[test]
fn test_zero_detection_scan_writes_summary_row() {
    let dir = tempdir().unwrap();
    let log = DetectionLog::open(dir.path().join("detections.csv")).unwrap();

    assert_eq!(append(&log, "empty.png", &[]), 1);

    let records = log.read_all().unwrap();
    assert_eq!(records.len(), 1);
    let row = &records[0];
    assert!(row.is_summary());
    assert_eq!(row.threat_level, ThreatTier::Clear);
    assert_eq!(row.total_detections, 0);
    assert_eq!(row.confidence, None);
    assert_eq!(row.risk_level, None);
}

#[test]
fn test_recent_returns_tail() {
    let dir = tempdir().unwrap();
    let log = DetectionLog::open(dir.path().join("detections.csv")).unwrap();
    for i in 0..5 {
        append(&log, &format!("img_{}.jpg", i), &[("car", 0.5)]);
    }

    let recent = log.recent(2).unwrap();
    let names: Vec<&str> = recent.iter().map(|r| r.image_filename.as_str()).collect();
    assert_eq!(names, vec!["img_3.jpg", "img_4.jpg"]);
    assert_eq!(log.recent(100).unwrap().len(), 5);
}

#[test]
fn test_missing_file_reads_empty() {
    let dir = tempdir().unwrap();
    let log = DetectionLog::open(dir.path().join("never_written.csv")).unwrap();
    assert!(log.read_all().unwrap().is_empty());
    assert_eq!(log.export_csv().unwrap().trim_end(), HEADERS.join(","));
}

#[test]
fn test_malformed_rows_are_skipped() {
    let dir = tempdir().unwrap();
    let log = DetectionLog::open(dir.path().join("detections.csv")).unwrap();
    append(&log, "a.jpg", &[("truck", 0.9)]);

    let mut content = std::fs::read_to_string(log.path()).unwrap();
    content.push_str("not,a,valid,row\n");
    std::fs::write(log.path(), content).unwrap();
    append(&log, "b.jpg", &[("car", 0.9)]);

    let records = log.read_all().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].image_filename, "b.jpg");
}

#[test]
fn test_export_parse_round_trip() {
    let dir = tempdir().unwrap();
    let log = DetectionLog::open(dir.path().join("detections.csv")).unwrap();
    append(&log, "a.jpg", &[("truck", 0.8912), ("person", 0.7634)]);
    append(&log, "b.jpg", &[]);
    append(&log, "c, with comma.jpg", &[("knife", 0.95)]);

    let stored = log.read_all().unwrap();
    let exported = log.export_csv().unwrap();
    let parsed = parse_csv(&exported).unwrap();

    assert_eq!(parsed.len(), 4);
    assert_eq!(parsed, stored);
    assert!(exported.starts_with(&HEADERS.join(",")));
}

#[test]
fn test_parse_rejects_wrong_header() {
    let text = "timestamp,image\n2025-01-01 00:00:00,a.jpg\n";
    assert!(matches!(parse_csv(text), Err(LogError::Format(_))));
}

#[test]
fn test_concurrent_appends_do_not_interleave() {
    let dir = tempdir().unwrap();
    let log = Arc::new(DetectionLog::open(dir.path().join("detections.csv")).unwrap());
    let classes = [("truck", 0.9), ("car", 0.8), ("person", 0.7), ("bus", 0.6), ("dog", 0.5)];

    std::thread::scope(|scope| {
        for t in 0..8 {
            let log = Arc::clone(&log);
            scope.spawn(move || {
                for i in 0..10 {
                    append(&log, &format!("scan_{}_{}.jpg", t, i), &classes);
                }
            });
        }
    });

    let records = log.read_all().unwrap();
    assert_eq!(records.len(), 8 * 10 * classes.len());

    // Each scan's rows are contiguous and complete
    let mut groups: HashMap<&str, usize> = HashMap::new();
    for chunk in records.chunks(classes.len()) {
        let name = chunk[0].image_filename.as_str();
        assert!(chunk.iter().all(|r| r.image_filename == name), "interleaved rows for {}", name);
        *groups.entry(name).or_insert(0) += 1;
    }
    assert_eq!(groups.len(), 80);
    assert!(groups.values().all(|&n| n == 1));
}
