//! SITREP and chat payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aegis_core::logic::analyst::ChatMessage;

#[derive(Debug, Serialize)]
pub struct SitrepResponse {
    pub success: bool,
    pub scan_id: String,
    pub sitrep: String,
    pub model: String,
    pub tokens: u32,
    pub timestamp: DateTime<Utc>,
    pub chat_history: Vec<ChatMessage>,
}

/// Missing fields are reported as 400, not as a JSON rejection
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub scan_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub scan_id: String,
    pub answer: String,
    pub tokens: u32,
}
