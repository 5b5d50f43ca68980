//! LLM request/response types for specforge
//!
//! These types model a plain multi-turn text exchange. Provider clients map them
//! onto their own wire formats (see `gemini.rs`).

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instruction (rendered from a Handlebars template)
    pub system_prompt: String,

    /// Conversation turns, oldest first
    pub messages: Vec<Message>,

    /// Max tokens for response (capped by config)
    pub max_tokens: u32,

    /// Sampling temperature; provider default when None
    pub temperature: Option<f32>,

    /// JSON schema constraining the response; plain text when None
    pub response_schema: Option<serde_json::Value>,
}

impl CompletionRequest {
    /// Create a text request with no temperature override and no schema
    pub fn new(system_prompt: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        debug!(message_count = %messages.len(), %max_tokens, "CompletionRequest::new: called");
        Self {
            system_prompt: system_prompt.into(),
            messages,
            max_tokens,
            temperature: None,
            response_schema: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        debug!(%temperature, "CompletionRequest::with_temperature: called");
        self.temperature = Some(temperature);
        self
    }

    /// Constrain the output to JSON matching `schema`
    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        debug!("CompletionRequest::with_response_schema: called");
        self.response_schema = Some(schema);
        self
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message with text content
    pub fn assistant(text: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage reported by the provider
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Text content, treating an empty string the same as no content
    pub fn text(&self) -> Option<&str> {
        debug!("CompletionResponse::text: called");
        self.content.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    Safety,
    Other(String),
}

impl StopReason {
    /// Parse from a Gemini `finishReason` string
    pub fn from_gemini(s: &str) -> Self {
        debug!(%s, "StopReason::from_gemini: called");
        match s {
            "STOP" => {
                debug!("StopReason::from_gemini: EndTurn");
                StopReason::EndTurn
            }
            "MAX_TOKENS" => {
                debug!("StopReason::from_gemini: MaxTokens");
                StopReason::MaxTokens
            }
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => {
                debug!("StopReason::from_gemini: Safety");
                StopReason::Safety
            }
            other => {
                debug!("StopReason::from_gemini: unrecognized reason");
                StopReason::Other(other.to_string())
            }
        }
    }
}

/// Token usage for a single call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Streaming chunk for incremental display
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// Text being generated
    TextDelta(String),

    /// Message complete with final stats
    MessageDone { stop_reason: StopReason, usage: TokenUsage },

    /// Error during streaming
    Error(String),
}
