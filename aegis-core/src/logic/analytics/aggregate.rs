//! Snapshot Aggregation
//!
//! Pure function of (records, now, options). Everything except
//! `recent_rows` is independent of record order.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Timelike, Utc};

use super::types::{
    AnalyticsSnapshot, ClassCount, DailyCount, HeatmapRow, HistogramBin, Summary, ThreatDistribution,
};
use crate::constants::{CONFIDENCE_BINS, DASHBOARD_RECENT_ROWS, DASHBOARD_TOP_CLASSES, DASHBOARD_TRAILING_DAYS};
use crate::logic::telemetry::LogRecord;
use crate::logic::threat::{RiskTable, ThreatTier};

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    /// Used to label `top_classes` with a risk level
    pub risk_table: RiskTable,
    pub top_classes: usize,
    pub trailing_days: usize,
    pub recent_rows: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            risk_table: RiskTable::default(),
            top_classes: DASHBOARD_TOP_CLASSES,
            trailing_days: DASHBOARD_TRAILING_DAYS,
            recent_rows: DASHBOARD_RECENT_ROWS,
        }
    }
}

impl SnapshotOptions {
    pub fn with_risk_table(risk_table: RiskTable) -> Self {
        Self {
            risk_table,
            ..Default::default()
        }
    }
}

// ============================================================================
// MAIN AGGREGATION
// ============================================================================

pub fn compute_snapshot(records: &[LogRecord], now: DateTime<Utc>, options: &SnapshotOptions) -> AnalyticsSnapshot {
    let detections: Vec<&LogRecord> = records.iter().filter(|r| !r.is_summary()).collect();
    let scans = scan_tiers(records);
    let top_classes = top_classes(&detections, options);

    let today = now.date_naive();
    let critical_today = scans
        .values()
        .filter(|(tier, ts)| *tier == ThreatTier::Critical && ts.date() == today)
        .count();

    let confidences: Vec<f32> = detections.iter().filter_map(|r| r.confidence).collect();
    let avg_confidence = if confidences.is_empty() {
        0.0
    } else {
        let sum: f64 = confidences.iter().map(|&c| c as f64).sum();
        round4(sum / confidences.len() as f64)
    };

    let summary = Summary {
        total_scans: scans.len(),
        total_detections: detections.len(),
        critical_today,
        most_detected_class: top_classes.first().map(|c| c.class_name.clone()),
        avg_confidence,
    };

    AnalyticsSnapshot {
        summary,
        threat_distribution: threat_distribution(&scans),
        detections_over_time: detections_over_time(&detections, now, options.trailing_days),
        top_classes,
        hourly_heatmap: hourly_heatmap(&detections),
        confidence_histogram: confidence_histogram(&confidences),
        recent_rows: records.iter().rev().take(options.recent_rows).cloned().collect(),
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Tier and latest timestamp per distinct scan. Rows of one scan share a
/// tier; the max is taken anyway so a hand-edited store stays deterministic.
fn scan_tiers(records: &[LogRecord]) -> HashMap<&str, (ThreatTier, NaiveDateTime)> {
    let mut scans: HashMap<&str, (ThreatTier, NaiveDateTime)> = HashMap::new();
    for record in records {
        let ts = record.timestamp.naive_utc();
        scans
            .entry(record.image_filename.as_str())
            .and_modify(|(tier, seen)| {
                *tier = (*tier).max(record.threat_level);
                *seen = (*seen).max(ts);
            })
            .or_insert((record.threat_level, ts));
    }
    scans
}

fn threat_distribution(scans: &HashMap<&str, (ThreatTier, NaiveDateTime)>) -> ThreatDistribution {
    let mut dist = ThreatDistribution::default();
    for (tier, _) in scans.values() {
        match tier {
            ThreatTier::Critical => dist.critical += 1,
            ThreatTier::High => dist.high += 1,
            ThreatTier::Elevated => dist.elevated += 1,
            ThreatTier::Low => dist.low += 1,
            ThreatTier::Clear => dist.clear += 1,
        }
    }
    dist
}

/// Where a row sits in append order, recovered from its content: scans are
/// appended in time order and a scan's rows are written high risk first,
/// then by confidence.
type Sighting = (DateTime<Utc>, u8, i64);

fn sighting(record: &LogRecord) -> Sighting {
    let priority = record.risk_level.map(|r| r.priority()).unwrap_or(u8::MAX);
    let confidence = record.confidence.map(|c| (c as f64 * 10_000.0).round() as i64).unwrap_or(0);
    (record.timestamp, priority, -confidence)
}

/// By count desc, then first sighting, then name
fn top_classes(detections: &[&LogRecord], options: &SnapshotOptions) -> Vec<ClassCount> {
    let mut counts: HashMap<&str, (usize, Sighting)> = HashMap::new();
    for record in detections {
        if let Some(name) = record.class_name.as_deref() {
            let seen = sighting(record);
            counts
                .entry(name)
                .and_modify(|(count, first)| {
                    *count += 1;
                    *first = (*first).min(seen);
                })
                .or_insert((1, seen));
        }
    }

    let mut ranked: Vec<(&str, usize, Sighting)> =
        counts.into_iter().map(|(name, (count, first))| (name, count, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)).then(a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(options.top_classes)
        .map(|(name, count, _)| ClassCount {
            class_name: name.to_string(),
            count,
            risk: options.risk_table.risk_of(name),
        })
        .collect()
}

/// Zero-filled daily counts, oldest first, ending on `now`'s date
fn detections_over_time(detections: &[&LogRecord], now: DateTime<Utc>, days: usize) -> Vec<DailyCount> {
    let mut per_day: BTreeMap<chrono::NaiveDate, usize> = BTreeMap::new();
    for record in detections {
        *per_day.entry(record.timestamp.date_naive()).or_insert(0) += 1;
    }

    let today = now.date_naive();
    (0..days as i64)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            DailyCount {
                date: date.format("%Y-%m-%d").to_string(),
                count: per_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

fn hourly_heatmap(detections: &[&LogRecord]) -> Vec<HeatmapRow> {
    let mut grid = [[0usize; 24]; 7];
    for record in detections {
        let day = record.timestamp.weekday().num_days_from_monday() as usize;
        let hour = record.timestamp.hour() as usize;
        grid[day][hour] += 1;
    }

    WEEKDAYS
        .iter()
        .zip(grid)
        .map(|(day, hours)| HeatmapRow {
            day: day.to_string(),
            hours,
        })
        .collect()
}

/// Right-closed bins of width 0.1; 0.0 falls in the first bin
fn confidence_histogram(confidences: &[f32]) -> Vec<HistogramBin> {
    let mut counts = [0usize; CONFIDENCE_BINS];
    for &c in confidences {
        if !(0.0..=1.0).contains(&c) {
            continue;
        }
        let bin = (0..CONFIDENCE_BINS)
            .find(|&i| c <= (i + 1) as f32 / CONFIDENCE_BINS as f32)
            .unwrap_or(CONFIDENCE_BINS - 1);
        counts[bin] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| HistogramBin {
            bin: bin_label(i),
            count,
        })
        .collect()
}

pub fn bin_label(i: usize) -> String {
    format!(
        "{:.1}-{:.1}",
        i as f32 / CONFIDENCE_BINS as f32,
        (i + 1) as f32 / CONFIDENCE_BINS as f32
    )
}

fn round4(value: f64) -> f32 {
    ((value * 10_000.0).round() / 10_000.0) as f32
}
