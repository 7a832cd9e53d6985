//! SITREP Store
//!
//! JSON file keyed by scan id. Loaded once at open, rewritten atomically
//! (temp file + rename) on every change, bounded to the newest
//! `SITREP_KEEP_LAST` scans by timestamp.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatRole, SitrepResult, StoreError};
use crate::constants::SITREP_KEEP_LAST;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitrepEntry {
    pub scan_id: String,
    pub timestamp: DateTime<Utc>,
    pub detection_context: String,
    pub sitrep: String,
    pub model: String,
    pub tokens: u32,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

pub struct SitrepStore {
    path: PathBuf,
    keep_last: usize,
    entries: Mutex<BTreeMap<String, SitrepEntry>>,
}

impl SitrepStore {
    /// A missing or unreadable file starts an empty store
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = match fs::read_to_string(&path) {
            Ok(text) if !text.trim().is_empty() => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("SITREP store {} unreadable ({}), starting empty", path.display(), e);
                    BTreeMap::new()
                }
            },
            Ok(_) => BTreeMap::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        log::info!("SITREP store opened: {} ({} entries)", path.display(), entries.len());

        Ok(Self {
            path,
            keep_last: SITREP_KEEP_LAST,
            entries: Mutex::new(entries),
        })
    }

    pub fn with_keep_last(mut self, keep_last: usize) -> Self {
        self.keep_last = keep_last.max(1);
        self
    }

    /// Store a successful SITREP for a scan
    pub fn save(&self, scan_id: &str, detection_context: &str, result: &SitrepResult) -> Result<(), StoreError> {
        self.insert(SitrepEntry {
            scan_id: scan_id.to_string(),
            timestamp: Utc::now(),
            detection_context: detection_context.to_string(),
            sitrep: result.sitrep.clone(),
            model: result.model.clone(),
            tokens: result.tokens,
            chat_history: Vec::new(),
        })
    }

    pub fn insert(&self, entry: SitrepEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        log::info!("Saved SITREP for scan {}", entry.scan_id);
        entries.insert(entry.scan_id.clone(), entry);
        self.trim(&mut entries);
        self.persist(&entries)
    }

    pub fn get(&self, scan_id: &str) -> Option<SitrepEntry> {
        self.entries.lock().get(scan_id).cloned()
    }

    pub fn chat_history(&self, scan_id: &str) -> Vec<ChatMessage> {
        self.entries
            .lock()
            .get(scan_id)
            .map(|e| e.chat_history.clone())
            .unwrap_or_default()
    }

    pub fn add_chat_message(&self, scan_id: &str, message: ChatMessage) -> Result<(), StoreError> {
        self.append_messages(scan_id, [message])
    }

    /// Question and answer are appended together
    pub fn add_chat_exchange(&self, scan_id: &str, question: &str, answer: &str) -> Result<(), StoreError> {
        self.append_messages(
            scan_id,
            [
                ChatMessage::new(ChatRole::User, question),
                ChatMessage::new(ChatRole::Assistant, answer),
            ],
        )
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn append_messages<I>(&self, scan_id: &str, messages: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = ChatMessage>,
    {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(scan_id)
            .ok_or_else(|| StoreError::NotFound(scan_id.to_string()))?;
        entry.chat_history.extend(messages);
        log::debug!("Chat history for {} now {} messages", scan_id, entry.chat_history.len());
        self.persist(&entries)
    }

    fn trim(&self, entries: &mut BTreeMap<String, SitrepEntry>) {
        if entries.len() <= self.keep_last {
            return;
        }

        let mut by_age: Vec<(DateTime<Utc>, String)> =
            entries.values().map(|e| (e.timestamp, e.scan_id.clone())).collect();
        by_age.sort();

        let excess = entries.len() - self.keep_last;
        for (_, scan_id) in by_age.into_iter().take(excess) {
            entries.remove(&scan_id);
        }
        log::info!("Trimmed {} old SITREPs, kept {}", excess, entries.len());
    }

    fn persist(&self, entries: &BTreeMap<String, SitrepEntry>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
