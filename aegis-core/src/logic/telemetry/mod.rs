//! Telemetry Module
//!
//! Append-only detection log. Every processed image leaves one group of
//! rows; analytics and the CSV export are derived from it.
//!
//! ## Structure
//! - `record.rs` - LogRecord row (immutable, timestamped) and ScanEntry
//! - `recorder.rs` - Append-only CSV writer (thread-safe)
//! - `exporter.rs` - CSV export and parse
//!
//! ## Usage
//! ```ignore
//! use aegis_core::logic::telemetry::{DetectionLog, ScanEntry};
//!
//! let log = DetectionLog::open("logs/detections.csv")?;
//! log.append_scan(&entry)?;
//! let recent = log.recent(50)?;
//! ```

pub mod record;
pub mod recorder;
pub mod exporter;

#[cfg(test)]
mod tests;

pub use record::{LogRecord, ScanEntry, HEADERS};

pub use recorder::DetectionLog;

pub use exporter::{export_csv, parse_csv};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Log format error: {0}")]
    Format(String),
}
