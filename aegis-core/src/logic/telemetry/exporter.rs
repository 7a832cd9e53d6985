//! Detection Log Exporter
//!
//! CSV encoding shared by the recorder and the export endpoint.

use super::record::{LogRecord, HEADERS};
use super::LogError;

/// Serialise records, optionally preceded by the header row
pub(crate) fn encode(records: &[LogRecord], with_header: bool) -> Result<Vec<u8>, LogError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(HEADERS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| LogError::Io(e.into_error()))
}

/// Header plus one line per record. Header only when `records` is empty.
pub fn export_csv(records: &[LogRecord]) -> Result<String, LogError> {
    let bytes = encode(records, true)?;
    String::from_utf8(bytes).map_err(|e| LogError::Format(e.to_string()))
}

/// Strict parse of an exported document
pub fn parse_csv(text: &str) -> Result<Vec<LogRecord>, LogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.iter().ne(HEADERS.iter().copied()) {
        return Err(LogError::Format(format!("Unexpected header: {:?}", headers)));
    }

    reader
        .deserialize::<LogRecord>()
        .map(|row| row.map_err(LogError::from))
        .collect()
}
