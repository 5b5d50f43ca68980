//! Model Gateway - every call to the generation service goes through here
//!
//! Two shapes of call:
//! 1. [`ModelGateway::open_interview`] returns a [`ConversationHandle`] for the
//!    multi-turn interview (session state lives in the handle)
//! 2. [`ModelGateway::generate_document`] is a stateless single-shot call with
//!    schema-constrained JSON output
//!
//! ```text
//! InterviewController ──open_interview──▶ ConversationHandle ──converse──▶ LLM
//!          │
//!          └──────generate_document(history, idea)──────────────────────▶ LLM
//!                                                       (JSON, spec_schema)
//! ```

mod conversation;
mod error;
pub mod schema;

pub use conversation::{ConversationHandle, EMPTY_REPLY_FALLBACK};
pub use error::GatewayError;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::domain::{ConversationMessage, ExperienceLevel, SpecDocument};
use crate::llm::{CompletionRequest, LlmClient, Message, StopReason};
use crate::prompts::{DocumentPromptContext, InterviewPromptContext, PromptLoader};

/// First wire message of every interview; never stored as a user message
pub fn kickoff_message(idea: &str) -> String {
    format!("The user is ready. Their idea is: \"{}\". Begin the interview.", idea)
}

/// Flatten history into `ROLE: text` lines
pub fn flatten_transcript(history: &[ConversationMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role_tag(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Entry point for all generation-service calls
pub struct ModelGateway {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    temperature: f32,
    max_tokens: u32,
}

impl ModelGateway {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader, config: &LlmConfig) -> Self {
        debug!(model = %config.model, temperature = %config.temperature, "ModelGateway::new: called");
        Self {
            llm,
            prompts,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Open a conversation for one interview session
    pub fn open_interview(
        &self,
        user_id: &str,
        idea: &str,
        level: ExperienceLevel,
    ) -> Result<ConversationHandle, GatewayError> {
        debug!(%user_id, %level, "open_interview: called");
        let context = InterviewPromptContext::new(user_id, idea, level);
        let system_prompt = self
            .prompts
            .interview_prompt(&context)
            .map_err(|e| GatewayError::Prompt(e.to_string()))?;

        Ok(ConversationHandle::new(
            self.llm.clone(),
            system_prompt,
            self.temperature,
            self.max_tokens,
        ))
    }

    /// Extract a spec document from the whole conversation
    ///
    /// Empty text and unparsable JSON are both errors; no partial document is
    /// ever synthesized.
    pub async fn generate_document(
        &self,
        history: &[ConversationMessage],
        idea: &str,
    ) -> Result<SpecDocument, GatewayError> {
        debug!(message_count = %history.len(), "generate_document: called");
        let context = DocumentPromptContext {
            idea: idea.to_string(),
            conversation: flatten_transcript(history),
        };
        let prompt = self
            .prompts
            .document_prompt(&context)
            .map_err(|e| GatewayError::Prompt(e.to_string()))?;

        let request = CompletionRequest::new(String::new(), vec![Message::user(prompt)], self.max_tokens)
            .with_response_schema(schema::spec_schema());

        let response = self.llm.complete(request).await?;
        let Some(text) = response.text() else {
            warn!(stop_reason = ?response.stop_reason, "generate_document: no text returned from model");
            return Err(GatewayError::EmptyResponse);
        };

        let document: SpecDocument = serde_json::from_str(text).map_err(|e| {
            if response.stop_reason == StopReason::MaxTokens {
                warn!(output_tokens = %response.usage.output_tokens, "generate_document: hit max tokens mid-document");
                return GatewayError::TruncatedDocument {
                    output_tokens: response.usage.output_tokens,
                    source: e,
                };
            }
            warn!(error = %e, "generate_document: response is not a valid document");
            GatewayError::MalformedDocument(e)
        })?;

        info!(
            title = %document.title,
            input_tokens = %response.usage.input_tokens,
            output_tokens = %response.usage.output_tokens,
            "Generated spec document"
        );
        Ok(document)
    }
}
