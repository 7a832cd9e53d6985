//! Analytics Module
//!
//! Dashboard aggregates over the whole detection log.
//!
//! ## Structure
//! - `types`: AnalyticsSnapshot and its parts
//! - `aggregate`: `compute_snapshot`

pub mod types;
pub mod aggregate;


pub use types::{
    AnalyticsSnapshot,
    ClassCount,
    DailyCount,
    HeatmapRow,
    HistogramBin,
    Summary,
    ThreatDistribution,
};

pub use aggregate::{compute_snapshot, SnapshotOptions};
