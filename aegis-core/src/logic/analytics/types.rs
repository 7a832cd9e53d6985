//! Analytics Types
//!
//! Dashboard snapshot structures. Recomputed per request, never persisted.

use serde::{Deserialize, Serialize};

use crate::logic::telemetry::LogRecord;
use crate::logic::threat::RiskLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub summary: Summary,
    pub threat_distribution: ThreatDistribution,
    pub detections_over_time: Vec<DailyCount>,
    pub top_classes: Vec<ClassCount>,
    pub hourly_heatmap: Vec<HeatmapRow>,
    pub confidence_histogram: Vec<HistogramBin>,
    /// Newest first
    pub recent_rows: Vec<LogRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Distinct image filenames
    pub total_scans: usize,
    /// Detection rows (summary rows excluded)
    pub total_detections: usize,
    /// Distinct CRITICAL scans on the current UTC date
    pub critical_today: usize,
    pub most_detected_class: Option<String>,
    pub avg_confidence: f32,
}

/// Scans per tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatDistribution {
    #[serde(rename = "CRITICAL")]
    pub critical: usize,
    #[serde(rename = "HIGH")]
    pub high: usize,
    #[serde(rename = "ELEVATED")]
    pub elevated: usize,
    #[serde(rename = "LOW")]
    pub low: usize,
    #[serde(rename = "CLEAR")]
    pub clear: usize,
}

impl ThreatDistribution {
    pub fn total(&self) -> usize {
        self.critical + self.high + self.elevated + self.low + self.clear
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// `%Y-%m-%d`
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCount {
    pub class_name: String,
    pub count: usize,
    pub risk: RiskLevel,
}

/// One weekday, 24 hourly buckets (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub day: String,
    pub hours: [usize; 24],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub bin: String,
    pub count: usize,
}
