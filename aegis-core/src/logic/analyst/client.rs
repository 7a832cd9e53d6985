//! Analyst LLM Client
//!
//! One wire format: OpenAI-compatible `POST {base_url}/chat/completions`
//! with bearer auth. Works against OpenRouter, Groq and OpenAI.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::context::SYSTEM_PROMPT;
use super::{AnalystError, ChatMessage, ChatReply, ChatRole, SitrepResult};
use crate::constants::{
    DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MAX_TOKENS, DEFAULT_LLM_MODEL, DEFAULT_LLM_TEMPERATURE,
    ENRICHMENT_HTTP_TIMEOUT_SECS,
};
use crate::logic::retry::{default_backoff, retry_once};

#[derive(Debug, Clone)]
pub struct AnalystConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl AnalystConfig {
    pub fn from_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            max_tokens: DEFAULT_LLM_MAX_TOKENS,
            temperature: DEFAULT_LLM_TEMPERATURE,
        }
    }
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

struct Completion {
    text: String,
    tokens: u32,
}

fn parse_completion(body: CompletionResponse) -> Result<Completion, AnalystError> {
    let text = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| AnalystError::Parse("response has no message content".to_string()))?;

    Ok(Completion {
        text,
        tokens: body.usage.map(|u| u.total_tokens).unwrap_or(0),
    })
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct AnalystClient {
    config: AnalystConfig,
    http_client: reqwest::Client,
    backoff: Duration,
}

impl AnalystClient {
    pub fn new(config: AnalystConfig) -> Result<Self, AnalystError> {
        if config.api_key.trim().is_empty() {
            return Err(AnalystError::Disabled);
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ENRICHMENT_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| AnalystError::Http(e.to_string()))?;

        Ok(Self {
            config: AnalystConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            http_client,
            backoff: default_backoff(),
        })
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Never fails; errors land in `SitrepResult::error`
    pub async fn generate_sitrep(&self, detection_context: &str) -> SitrepResult {
        log::info!("Generating SITREP with {}", self.config.model);

        let messages = [
            ChatMessage::new(ChatRole::System, SYSTEM_PROMPT),
            ChatMessage::new(
                ChatRole::User,
                format!("Generate a tactical SITREP for this detection scan:\n\n{}", detection_context),
            ),
        ];

        match self.complete(&messages).await {
            Ok(completion) => {
                log::info!("SITREP generated ({} tokens)", completion.tokens);
                SitrepResult {
                    success: true,
                    sitrep: completion.text,
                    model: self.config.model.clone(),
                    tokens: completion.tokens,
                    error: String::new(),
                }
            }
            Err(e) => {
                log::error!("SITREP generation failed: {}", e);
                SitrepResult::failed(&e)
            }
        }
    }

    /// Follow-up question with the scan context and prior turns
    pub async fn chat(
        &self,
        scan_id: &str,
        detection_context: &str,
        sitrep: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<ChatReply, AnalystError> {
        let system = format!(
            "{}\n\nCURRENT SCAN CONTEXT (Scan ID: {}):\n\n{}\n\nPREVIOUSLY GENERATED SITREP:\n{}\n\n\
             The operator is asking follow-up questions about this scan. Answer from the detection data above, concise and tactical.",
            SYSTEM_PROMPT, scan_id, detection_context, sitrep
        );

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::new(ChatRole::System, system));
        messages.extend(history.iter().filter(|m| m.role != ChatRole::System).cloned());
        messages.push(ChatMessage::new(ChatRole::User, question));

        log::info!("Answering follow-up for scan {}", scan_id);
        let completion = self.complete(&messages).await?;
        log::info!("Chat response generated ({} tokens)", completion.tokens);

        Ok(ChatReply {
            answer: completion.text,
            tokens: completion.tokens,
        })
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, AnalystError> {
        retry_once("LLM request", self.backoff, || self.complete_once(messages)).await
    }

    async fn complete_once(&self, messages: &[ChatMessage]) -> Result<Completion, AnalystError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalystError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnalystError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AnalystError::Parse(e.to_string()))?;

        parse_completion(body)
    }
}
