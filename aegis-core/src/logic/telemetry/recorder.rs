//! Detection Log Recorder
//!
//! Append-only CSV store. One image's batch is serialised in memory and
//! written with a single `write_all` under the lock, so concurrent scans
//! never interleave their rows.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::exporter;
use super::record::{LogRecord, ScanEntry};
use super::LogError;

// ============================================================================
// RECORDER
// ============================================================================

pub struct DetectionLog {
    path: PathBuf,
    /// Serialises appends and full reads
    lock: Mutex<()>,
}

impl DetectionLog {
    /// Create parent directories; the file itself is created on first append
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        log::info!("Detection log: {:?}", path);

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append all rows for one scan. Returns the number of rows written.
    pub fn append_scan(&self, entry: &ScanEntry<'_>) -> Result<usize, LogError> {
        let records = entry.records();

        let _guard = self.lock.lock();

        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let batch = exporter::encode(&records, needs_header)?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&batch)?;
        file.flush()?;

        log::info!("Logged {} detection rows for {}", records.len(), entry.image_filename);
        Ok(records.len())
    }

    /// Every parseable record in append order. Malformed rows are skipped.
    pub fn read_all(&self) -> Result<Vec<LogRecord>, LogError> {
        let _guard = self.lock.lock();

        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_slice());

        let mut records = Vec::new();
        for (line, row) in reader.deserialize::<LogRecord>().enumerate() {
            match row {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping malformed log row {}: {}", line + 2, e),
            }
        }
        Ok(records)
    }

    /// Last `limit` records, oldest first
    pub fn recent(&self, limit: usize) -> Result<Vec<LogRecord>, LogError> {
        let records = self.read_all()?;
        let skip = records.len().saturating_sub(limit);
        Ok(records.into_iter().skip(skip).collect())
    }

    /// Full store in the fixed column order, header included
    pub fn export_csv(&self) -> Result<String, LogError> {
        let records = self.read_all()?;
        exporter::export_csv(&records)
    }
}
