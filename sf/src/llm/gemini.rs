//! Google Gemini API client implementation
//!
//! Implements the LlmClient trait for the `generateContent` REST endpoint with
//! support for both blocking and SSE streaming responses. Calls are never
//! retried; every failure goes straight back to the caller.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use super::{
    CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, Role, StopReason, StreamChunk, TokenUsage,
};
use crate::config::LlmConfig;

/// Gemini API client
pub struct GeminiClient {
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl GeminiClient {
    /// Create a new client from configuration
    ///
    /// A missing API key does not fail here; each call reports it instead.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);

        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key: config.api_key(),
            api_key_env: config.api_key_env.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }

    fn key(&self) -> Result<&str, LlmError> {
        self.api_key.as_deref().ok_or_else(|| {
            debug!("key: no API key configured");
            LlmError::MissingApiKey(self.api_key_env.clone())
        })
    }

    /// Build the request body for the Gemini API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        let mut generation_config = serde_json::json!({
            "maxOutputTokens": request.max_tokens.min(self.max_tokens),
        });

        if let Some(temperature) = request.temperature {
            generation_config["temperature"] = serde_json::json!(temperature);
        }

        if let Some(schema) = &request.response_schema {
            debug!("build_request_body: adding response schema");
            generation_config["responseMimeType"] = serde_json::json!("application/json");
            generation_config["responseSchema"] = schema.clone();
        } else {
            debug!("build_request_body: plain text response");
        }

        let mut body = serde_json::json!({
            "contents": convert_messages(&request.messages),
            "generationConfig": generation_config,
        });

        if !request.system_prompt.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": request.system_prompt }],
            });
        }

        body
    }

    /// Map an unsuccessful HTTP response to an ApiError
    async fn api_error(response: reqwest::Response) -> LlmError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        debug!(%status, "api_error: API error");
        LlmError::ApiError { status, message: text }
    }
}

/// Convert internal Message types to Gemini `contents`
fn convert_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    debug!(message_count = %messages.len(), "convert_messages: called");
    messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            serde_json::json!({
                "role": role,
                "parts": [{ "text": msg.content }],
            })
        })
        .collect()
}

/// Parse a Gemini response into a CompletionResponse
fn parse_response(api_response: GeminiResponse) -> CompletionResponse {
    debug!(candidates = %api_response.candidates.len(), "parse_response: called");
    let mut stop_reason = StopReason::EndTurn;
    let mut text = String::new();

    if let Some(candidate) = api_response.candidates.into_iter().next() {
        if let Some(reason) = candidate.finish_reason.as_deref() {
            stop_reason = StopReason::from_gemini(reason);
        }
        if let Some(content) = candidate.content {
            text = content.text();
        }
    } else {
        debug!("parse_response: no candidates");
    }

    CompletionResponse {
        content: if text.is_empty() { None } else { Some(text) },
        stop_reason,
        usage: api_response.usage_metadata.map(TokenUsage::from).unwrap_or_default(),
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let api_key = self.key()?;
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(self.endpoint("generateContent"))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        debug!("complete: success");
        let api_response: GeminiResponse = response.json().await?;
        Ok(parse_response(api_response))
    }

    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "stream: called");
        let api_key = self.key()?;
        let body = self.build_request_body(&request);

        let http_request = self
            .http
            .post(format!("{}?alt=sse", self.endpoint("streamGenerateContent")))
            .header("x-goog-api-key", api_key)
            .json(&body);

        let mut es = EventSource::new(http_request).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let mut full_content = String::new();
        let mut stop_reason = StopReason::EndTurn;
        let mut usage = TokenUsage::default();

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("stream: Event::Open");
                }
                Ok(Event::Message(msg)) => {
                    debug!("stream: received Event::Message");
                    let chunk: GeminiResponse = serde_json::from_str(&msg.data)?;
                    if let Some(u) = chunk.usage_metadata {
                        usage = u.into();
                    }
                    if let Some(candidate) = chunk.candidates.into_iter().next() {
                        if let Some(reason) = candidate.finish_reason.as_deref() {
                            stop_reason = StopReason::from_gemini(reason);
                        }
                        let text = candidate.content.map(|c| c.text()).unwrap_or_default();
                        if !text.is_empty() {
                            full_content.push_str(&text);
                            let _ = chunk_tx.send(StreamChunk::TextDelta(text)).await;
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    debug!("stream: stream ended");
                    break;
                }
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    debug!(%status, "stream: invalid status code");
                    es.close();
                    let err = Self::api_error(response).await;
                    let _ = chunk_tx.send(StreamChunk::Error(err.to_string())).await;
                    return Err(err);
                }
                Err(e) => {
                    debug!(%e, "stream: Event error");
                    es.close();
                    let _ = chunk_tx.send(StreamChunk::Error(e.to_string())).await;
                    return Err(LlmError::InvalidResponse(e.to_string()));
                }
            }
        }
        es.close();

        debug!("stream: complete");
        let _ = chunk_tx
            .send(StreamChunk::MessageDone {
                stop_reason: stop_reason.clone(),
                usage: usage.clone(),
            })
            .await;

        Ok(CompletionResponse {
            content: if full_content.is_empty() { None } else { Some(full_content) },
            stop_reason,
            usage,
        })
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    /// Concatenated answer text, skipping thought summaries
    fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|p| !p.thought.unwrap_or(false))
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl From<GeminiUsage> for TokenUsage {
    fn from(u: GeminiUsage) -> Self {
        TokenUsage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        }
    }
}
