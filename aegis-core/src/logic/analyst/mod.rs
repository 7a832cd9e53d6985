//! Analyst Module
//!
//! LLM-written situation reports (SITREPs) and follow-up chat about a scan.
//! The analyst is optional: without an API key every call reports
//! "disabled" and scans proceed untouched.
//!
//! ## Structure
//! - `context`: Scan → prompt text, system prompt
//! - `client`: OpenAI-compatible chat-completions client
//! - `store`: JSON-file SITREP store with chat history
//!
//! ## Usage
//! ```ignore
//! let client = AnalystClient::new(AnalystConfig::from_key(key))?;
//! let context = build_detection_context(&detections, &threat, size, ms);
//! let result = client.generate_sitrep(&context).await;
//! store.save(&scan_id, &context, &result)?;
//! ```

use serde::{Deserialize, Serialize};

pub mod context;
pub mod client;
pub mod store;

pub use context::{build_detection_context, SYSTEM_PROMPT};
pub use client::{AnalystClient, AnalystConfig};
pub use store::{SitrepEntry, SitrepStore};

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalystError {
    #[error("AI analyst disabled: LLM API key not configured")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("LLM API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scan not found: {0}")]
    NotFound(String),
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// SITREP outcome as reported to the client. Failures are carried in
/// `error`, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitrepResult {
    pub success: bool,
    pub sitrep: String,
    pub model: String,
    pub tokens: u32,
    pub error: String,
}

impl SitrepResult {
    pub fn failed(error: &AnalystError) -> Self {
        Self {
            success: false,
            sitrep: String::new(),
            model: String::new(),
            tokens: 0,
            error: error.to_string(),
        }
    }

    pub fn disabled() -> Self {
        Self::failed(&AnalystError::Disabled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    pub tokens: u32,
}
