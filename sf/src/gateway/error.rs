//! Gateway error types

use thiserror::Error;

use crate::llm::LlmError;

/// Errors surfaced by the model gateway
///
/// Every variant is terminal for the attempt that produced it; nothing here is
/// retried.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Generation service failed: {0}")]
    Llm(#[from] LlmError),

    #[error("A turn is already in flight on this conversation")]
    Busy,

    #[error("No text returned from model")]
    EmptyResponse,

    #[error("Model returned a malformed document: {0}")]
    MalformedDocument(#[source] serde_json::Error),

    #[error("Document was cut off after {output_tokens} output tokens")]
    TruncatedDocument {
        output_tokens: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to build prompt: {0}")]
    Prompt(String),
}
