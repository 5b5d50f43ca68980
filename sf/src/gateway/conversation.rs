//! ConversationHandle - one multi-turn exchange with the generation service

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::GatewayError;
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, Message, StopReason, StreamChunk};

/// Reply used when the service answers with no text
pub const EMPTY_REPLY_FALLBACK: &str = "I didn't catch that.";

/// Multi-turn conversation state for one interview session
///
/// Owns the wire history (what was actually sent and received) and allows at
/// most one in-flight turn; a second concurrent `converse` fails with
/// [`GatewayError::Busy`] instead of interleaving turns.
pub struct ConversationHandle {
    id: String,
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
    history: Mutex<Vec<Message>>,
    busy: AtomicBool,
}

/// Clears the busy flag when a turn ends, however it ends
struct TurnGuard<'a>(&'a AtomicBool);

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ConversationHandle {
    pub(crate) fn new(llm: Arc<dyn LlmClient>, system_prompt: String, temperature: f32, max_tokens: u32) -> Self {
        let id = Uuid::now_v7().to_string();
        info!(%id, "Opened conversation");
        Self {
            id,
            llm,
            system_prompt,
            temperature,
            max_tokens,
            history: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Whether a turn is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Number of committed wire turns (user and model)
    pub fn turns(&self) -> usize {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn begin_turn(&self) -> Result<TurnGuard<'_>, GatewayError> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| {
                debug!(id = %self.id, "begin_turn: handle busy");
                GatewayError::Busy
            })?;
        Ok(TurnGuard(&self.busy))
    }

    fn request_with(&self, text: &str) -> (Message, CompletionRequest) {
        let user = Message::user(text);
        let mut messages = self.history.lock().unwrap_or_else(PoisonError::into_inner).clone();
        messages.push(user.clone());
        let request = CompletionRequest::new(self.system_prompt.clone(), messages, self.max_tokens)
            .with_temperature(self.temperature);
        (user, request)
    }

    /// Commit a completed turn and return the reply text
    fn commit(&self, user: Message, response: &CompletionResponse) -> String {
        debug!(
            id = %self.id,
            stop_reason = ?response.stop_reason,
            input_tokens = %response.usage.input_tokens,
            output_tokens = %response.usage.output_tokens,
            "commit: called"
        );
        if response.stop_reason == StopReason::MaxTokens {
            warn!(id = %self.id, "Reply was cut off at the token limit");
        }
        let reply = match response.content.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(text) => text.to_string(),
            None => {
                debug!(id = %self.id, "commit: empty reply, using fallback");
                EMPTY_REPLY_FALLBACK.to_string()
            }
        };
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push(user);
        history.push(Message::assistant(reply.clone()));
        reply
    }

    /// Send one user turn and wait for the assistant turn
    ///
    /// The turn is only committed to the wire history when the call succeeds.
    pub async fn converse(&self, text: &str) -> Result<String, GatewayError> {
        debug!(id = %self.id, text_len = text.len(), "converse: called");
        let _guard = self.begin_turn()?;
        let (user, request) = self.request_with(text);

        let response = self.llm.complete(request).await?;
        Ok(self.commit(user, &response))
    }

    /// Like [`converse`](Self::converse), forwarding text chunks as they arrive
    pub async fn converse_streaming(&self, text: &str, chunk_tx: mpsc::Sender<StreamChunk>) -> Result<String, GatewayError> {
        debug!(id = %self.id, text_len = text.len(), "converse_streaming: called");
        let _guard = self.begin_turn()?;
        let (user, request) = self.request_with(text);

        let response = self.llm.stream(request, chunk_tx).await?;
        Ok(self.commit(user, &response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, empty_response, text_response};
    use crate::llm::{LlmError, Role};
    use std::time::Duration;

    fn handle(mock: Arc<MockLlmClient>) -> ConversationHandle {
        ConversationHandle::new(mock, "system".to_string(), 0.7, 1024)
    }

    #[tokio::test]
    async fn test_converse_accumulates_history() {
        let mock = Arc::new(MockLlmClient::with_texts(&["first reply", "second reply"]));
        let handle = handle(mock.clone());

        assert_eq!(handle.converse("hello").await.unwrap(), "first reply");
        assert_eq!(handle.converse("more").await.unwrap(), "second reply");

        let requests = mock.requests();
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].messages[1].role, Role::Assistant);
        assert_eq!(requests[1].messages[1].content, "first reply");
        assert_eq!(requests[1].system_prompt, "system");
        assert_eq!(requests[1].temperature, Some(0.7));
        assert_eq!(handle.turns(), 4);
    }

    #[tokio::test]
    async fn test_empty_reply_uses_fallback() {
        let mock = Arc::new(MockLlmClient::new(vec![Ok(empty_response()), Ok(text_response("  "))]));
        let handle = handle(mock);

        assert_eq!(handle.converse("hi").await.unwrap(), EMPTY_REPLY_FALLBACK);
        assert_eq!(handle.converse("hi again").await.unwrap(), "I didn't catch that.");
    }

    #[tokio::test]
    async fn test_reply_text_is_kept_verbatim() {
        let mock = Arc::new(MockLlmClient::with_texts(&["  **Great!**\n\nWho is it for?\n"]));
        let handle = handle(mock.clone());

        let reply = handle.converse("hi").await.unwrap();
        assert_eq!(reply, "  **Great!**\n\nWho is it for?\n");

        handle.converse("next").await.ok();
        assert_eq!(mock.requests()[1].messages[1].content, "  **Great!**\n\nWho is it for?\n");
    }

    #[tokio::test]
    async fn test_failed_turn_is_not_committed() {
        let mock = Arc::new(MockLlmClient::new(vec![
            Err(LlmError::InvalidResponse("boom".to_string())),
            Ok(text_response("recovered")),
        ]));
        let handle = handle(mock.clone());

        assert!(matches!(handle.converse("lost").await, Err(GatewayError::Llm(_))));
        assert_eq!(handle.turns(), 0);
        assert!(!handle.is_busy());

        assert_eq!(handle.converse("retry by user").await.unwrap(), "recovered");
        let last = mock.requests().pop().unwrap();
        assert_eq!(last.messages.len(), 1);
        assert_eq!(last.messages[0].content, "retry by user");
    }

    #[tokio::test]
    async fn test_concurrent_turn_is_rejected() {
        let mock = Arc::new(MockLlmClient::with_texts(&["slow reply"]).with_delay(Duration::from_millis(200)));
        let handle = Arc::new(handle(mock.clone()));

        let first = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.converse("one").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(handle.is_busy());
        assert!(matches!(handle.converse("two").await, Err(GatewayError::Busy)));

        assert_eq!(first.await.unwrap().unwrap(), "slow reply");
        assert!(!handle.is_busy());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_converse_streaming_forwards_chunks() {
        let mock = Arc::new(MockLlmClient::with_texts(&["streamed reply"]));
        let handle = handle(mock);
        let (tx, mut rx) = mpsc::channel(8);

        assert_eq!(handle.converse_streaming("hi", tx).await.unwrap(), "streamed reply");
        assert!(matches!(rx.recv().await, Some(StreamChunk::TextDelta(ref t)) if t == "streamed reply"));
    }
}
