//! InterviewController - owns one session's lifecycle
//!
//! The controller is the only owner of the [`ConversationHandle`]; it is
//! created on `start` and dropped on `restart`, so a handle can never leak
//! across sessions.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{advance_phase, augment_outbound, finish_available, turn_count};
use crate::domain::{ExperienceLevel, Phase, Role, Session, SpecDocument};
use crate::gateway::{ConversationHandle, GatewayError, ModelGateway, kickoff_message};
use crate::llm::StreamChunk;
use crate::sink::{self, SessionSink};

/// Canned text sent by the skip action
pub const SKIP_MESSAGE: &str = "I'm not sure, let's skip this part and use your best judgment.";

/// Assistant message when the session cannot be opened
pub const CONNECT_FAILURE_REPLY: &str = "Sorry, I'm having trouble connecting. Please restart the session and try again.";

/// Assistant message when a turn fails
pub const TURN_FAILURE_REPLY: &str = "I encountered an error. Please try again.";

/// Assistant message when document generation fails
pub const FINISH_FAILURE_REPLY: &str = "I couldn't generate the spec just yet. Let's chat a bit more.";

/// Which screen the surface should show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Landing,
    Interview,
    Generating,
    Document,
}

/// Input the controller refuses; service failures are never reported here
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterviewError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Not available in the {0:?} view")]
    WrongView(View),
}

/// Drives one interview: session state, conversation handle and view
pub struct InterviewController {
    gateway: ModelGateway,
    sink: SessionSink,
    session: Session,
    handle: Option<ConversationHandle>,
    view: View,
}

impl InterviewController {
    pub fn new(gateway: ModelGateway, sink: SessionSink) -> Self {
        debug!(sink_enabled = %sink.is_enabled(), "InterviewController::new: called");
        Self {
            gateway,
            sink,
            session: Session::default(),
            handle: None,
            view: View::Landing,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// Whether to reveal the "generate document" affordance
    pub fn finish_available(&self, timer_expired: bool) -> bool {
        finish_available(self.session.phase(), timer_expired)
    }

    /// Begin a new interview, replacing any previous session
    pub async fn start(
        &mut self,
        user_id: &str,
        email: &str,
        idea: &str,
        level: ExperienceLevel,
        chunk_tx: Option<mpsc::Sender<StreamChunk>>,
    ) -> Result<(), InterviewError> {
        info!(%user_id, %level, "Starting interview");
        self.session = Session::new(user_id, email, idea, level);
        self.sink.record(sink::start_payload(&self.session));
        self.view = View::Interview;

        let handle = match self.gateway.open_interview(user_id, idea, level) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Failed to open interview");
                self.handle = None;
                self.session.push_message(Role::Assistant, CONNECT_FAILURE_REPLY);
                return Ok(());
            }
        };
        self.handle = Some(handle);

        match self.exchange(&kickoff_message(idea), chunk_tx).await {
            Ok(reply) => {
                self.session.push_message(Role::Assistant, reply);
            }
            Err(e) => {
                warn!(error = %e, "Error starting interview");
                self.session.push_message(Role::Assistant, CONNECT_FAILURE_REPLY);
            }
        }
        Ok(())
    }

    /// Send a user message and append the reply
    pub async fn send(&mut self, text: &str) -> Result<(), InterviewError> {
        self.send_streaming(text, None).await
    }

    /// Send a user message, forwarding reply chunks as they arrive
    pub async fn send_streaming(
        &mut self,
        text: &str,
        chunk_tx: Option<mpsc::Sender<StreamChunk>>,
    ) -> Result<(), InterviewError> {
        debug!(text_len = text.len(), "send_streaming: called");
        self.ensure_interview()?;
        if text.trim().is_empty() {
            return Err(InterviewError::EmptyMessage);
        }

        let phase = self.session.phase();
        self.session.push_message(Role::User, text);
        let wire = augment_outbound(text, phase);

        match self.exchange(&wire, chunk_tx).await {
            Ok(reply) => {
                self.session.push_message(Role::Assistant, reply);
                let turns = turn_count(self.session.messages().len());
                self.session.set_phase(advance_phase(phase, turns));
            }
            Err(e) => {
                warn!(error = %e, "Error sending message");
                self.session.push_message(Role::Assistant, TURN_FAILURE_REPLY);
            }
        }
        Ok(())
    }

    /// Skip the current question through the normal send path
    pub async fn skip(&mut self) -> Result<(), InterviewError> {
        debug!("skip: called");
        self.send(SKIP_MESSAGE).await
    }

    /// Generate the spec document from the full history
    ///
    /// On failure the view returns to the interview with one apology appended;
    /// history is untouched and finishing can be retried.
    pub async fn finish(&mut self) -> Result<Option<&SpecDocument>, InterviewError> {
        debug!("finish: called");
        self.ensure_interview()?;

        self.view = View::Generating;
        let result = self
            .gateway
            .generate_document(self.session.messages(), &self.session.initial_idea)
            .await;

        match result {
            Ok(document) => {
                self.sink.record(sink::result_payload(&self.session, &document));
                self.session.set_generated_spec(document);
                self.view = View::Document;
                Ok(self.session.generated_spec())
            }
            Err(e) => {
                warn!(error = %e, "Failed to generate spec");
                self.view = View::Interview;
                self.session.push_message(Role::Assistant, FINISH_FAILURE_REPLY);
                Ok(None)
            }
        }
    }

    /// Discard the session and conversation, back to the landing view
    pub fn restart(&mut self) {
        info!("Restarting session");
        self.session = Session::default();
        self.handle = None;
        self.view = View::Landing;
    }

    fn ensure_interview(&self) -> Result<(), InterviewError> {
        if self.view != View::Interview {
            return Err(InterviewError::WrongView(self.view));
        }
        Ok(())
    }

    /// One wire turn on the session's handle
    ///
    /// Overlapping turns are refused by the handle's busy flag.
    async fn exchange(
        &self,
        wire: &str,
        chunk_tx: Option<mpsc::Sender<StreamChunk>>,
    ) -> Result<String, GatewayError> {
        let Some(handle) = self.handle.as_ref() else {
            return Err(GatewayError::Prompt("Conversation not initialized".to_string()));
        };

        match chunk_tx {
            Some(tx) => handle.converse_streaming(wire, tx).await,
            None => handle.converse(wire).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::llm::LlmError;
    use crate::llm::client::mock::{MockLlmClient, empty_response, text_response};
    use crate::prompts::PromptLoader;
    use std::sync::Arc;

    const DOC_JSON: &str = r#"{
        "title": "Plantr",
        "summary": "Watering reminders.",
        "problemStatement": "Plants die.",
        "targetUsers": ["Renters"],
        "valueProposition": "Living plants.",
        "keyFeatures": ["Reminders"],
        "userStories": ["As a renter, I want reminders, so that plants live"]
    }"#;

    fn controller(mock: Arc<MockLlmClient>) -> InterviewController {
        let gateway = ModelGateway::new(mock, PromptLoader::embedded_only(), &LlmConfig::default());
        InterviewController::new(gateway, SessionSink::disabled())
    }

    async fn started(replies: &[&str]) -> (InterviewController, Arc<MockLlmClient>) {
        let mock = Arc::new(MockLlmClient::with_texts(replies));
        let mut ctl = controller(mock.clone());
        ctl.start("u1", "u1@example.com", "plant app", ExperienceLevel::Intermediate, None)
            .await
            .unwrap();
        (ctl, mock)
    }

    #[tokio::test]
    async fn test_start_appends_only_the_greeting() {
        let (ctl, mock) = started(&["Welcome! What problem?"]).await;

        assert_eq!(ctl.view(), View::Interview);
        assert_eq!(ctl.session().messages().len(), 1);
        assert_eq!(ctl.session().messages()[0].role, Role::Assistant);
        assert_eq!(ctl.session().messages()[0].text, "Welcome! What problem?");

        let requests = mock.requests();
        let kickoff = &requests[0].messages[0].content;
        assert!(kickoff.contains("Their idea is: \"plant app\""));
    }

    #[tokio::test]
    async fn test_start_failure_appends_apology() {
        let mock = Arc::new(MockLlmClient::new(vec![Err(LlmError::InvalidResponse("down".to_string()))]));
        let mut ctl = controller(mock);
        ctl.start("u1", "e", "idea", ExperienceLevel::Expert, None).await.unwrap();

        assert_eq!(ctl.view(), View::Interview);
        assert_eq!(ctl.session().messages()[0].text, CONNECT_FAILURE_REPLY);
    }

    #[tokio::test]
    async fn test_send_stores_original_but_sends_augmented() {
        let (mut ctl, mock) = started(&["hi", "Who are the users?"]).await;
        ctl.send("Renters forget to water plants").await.unwrap();

        let stored = &ctl.session().messages()[1];
        assert_eq!(stored.role, Role::User);
        assert_eq!(stored.text, "Renters forget to water plants");

        let requests = mock.requests();
        let wire = &requests[1].messages.last().unwrap().content;
        assert!(wire.starts_with("Renters forget to water plants\n[SYSTEM_NOTE: Current Phase: Idea & Goals."));
        assert!(ctl.session().messages().iter().all(|m| !m.text.contains("SYSTEM_NOTE")));
    }

    #[tokio::test]
    async fn test_send_rejects_blank_input() {
        let (mut ctl, mock) = started(&["hi"]).await;
        assert_eq!(ctl.send("   ").await, Err(InterviewError::EmptyMessage));
        assert_eq!(ctl.session().messages().len(), 1);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_send_outside_interview_is_rejected() {
        let mock = Arc::new(MockLlmClient::new(vec![]));
        let mut ctl = controller(mock);
        assert_eq!(ctl.send("hello").await, Err(InterviewError::WrongView(View::Landing)));
    }

    #[tokio::test]
    async fn test_send_failure_appends_apology_and_keeps_phase() {
        let mock = Arc::new(MockLlmClient::new(vec![
            Ok(text_response("hi")),
            Err(LlmError::ApiError {
                status: 500,
                message: "oops".to_string(),
            }),
        ]));
        let mut ctl = controller(mock);
        ctl.start("u1", "e", "idea", ExperienceLevel::Beginner, None).await.unwrap();
        ctl.send("answer").await.unwrap();

        let msgs = ctl.session().messages();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[2].role, Role::Assistant);
        assert_eq!(msgs[2].text, TURN_FAILURE_REPLY);
        assert_eq!(ctl.phase(), Phase::Idea);
    }

    #[tokio::test]
    async fn test_empty_reply_becomes_fallback_message() {
        let mock = Arc::new(MockLlmClient::new(vec![Ok(text_response("hi")), Ok(empty_response())]));
        let mut ctl = controller(mock);
        ctl.start("u1", "e", "idea", ExperienceLevel::Beginner, None).await.unwrap();
        ctl.send("answer").await.unwrap();

        assert_eq!(ctl.session().messages()[2].text, "I didn't catch that.");
    }

    #[tokio::test]
    async fn test_phase_advances_at_exact_threshold() {
        // greeting + 2 exchanges = 5 messages, turn count 2: still idea
        let (mut ctl, _) = started(&["greeting", "r1", "r2", "r3"]).await;
        ctl.send("a1").await.unwrap();
        ctl.send("a2").await.unwrap();
        assert_eq!(ctl.session().messages().len(), 5);
        assert_eq!(ctl.phase(), Phase::Idea);

        // third exchange: 7 messages, turn count 3
        ctl.send("a3").await.unwrap();
        assert_eq!(turn_count(ctl.session().messages().len()), 3);
        assert_eq!(ctl.phase(), Phase::Users);
    }

    #[tokio::test]
    async fn test_reaches_flows_and_stays() {
        let replies: Vec<String> = (0..16).map(|i| format!("r{}", i)).collect();
        let refs: Vec<&str> = replies.iter().map(String::as_str).collect();
        let (mut ctl, _) = started(&refs).await;

        let mut seen = vec![ctl.phase()];
        for i in 0..14 {
            ctl.send(&format!("answer {}", i)).await.unwrap();
            seen.push(ctl.phase());
        }

        assert_eq!(ctl.phase(), Phase::Flows);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(ctl.finish_available(false));
    }

    #[tokio::test]
    async fn test_finish_affordance_from_timer_alone() {
        let (ctl, _) = started(&["hi"]).await;
        assert_eq!(ctl.phase(), Phase::Idea);
        assert!(!ctl.finish_available(false));
        assert!(ctl.finish_available(true));
    }

    #[tokio::test]
    async fn test_skip_sends_canned_message() {
        let (mut ctl, mock) = started(&["hi", "ok, moving on"]).await;
        ctl.skip().await.unwrap();

        assert_eq!(ctl.session().messages()[1].text, SKIP_MESSAGE);
        assert!(mock.requests()[1].messages.last().unwrap().content.starts_with(SKIP_MESSAGE));
        assert_eq!(ctl.session().messages()[2].text, "ok, moving on");
    }

    #[tokio::test]
    async fn test_finish_success_moves_to_document() {
        let (mut ctl, mock) = started(&["hi", "tell me more", DOC_JSON]).await;
        ctl.send("plants die").await.unwrap();

        let doc = ctl.finish().await.unwrap().cloned().unwrap();
        assert_eq!(doc.title, "Plantr");
        assert_eq!(ctl.view(), View::Document);
        assert_eq!(ctl.session().generated_spec(), Some(&doc));

        let requests = mock.requests();
        let prompt = &requests[2].messages[0].content;
        assert!(prompt.contains("USER: plants die"));
        assert!(!prompt.contains("SYSTEM_NOTE"));
    }

    #[tokio::test]
    async fn test_finish_failure_empty_response_keeps_history() {
        let mock = Arc::new(MockLlmClient::new(vec![
            Ok(text_response("hi")),
            Ok(text_response("go on")),
            Ok(empty_response()),
        ]));
        let mut ctl = controller(mock);
        ctl.start("u1", "e", "idea", ExperienceLevel::Expert, None).await.unwrap();
        ctl.send("answer").await.unwrap();
        let before: Vec<_> = ctl.session().messages().to_vec();

        assert!(ctl.finish().await.unwrap().is_none());

        assert_eq!(ctl.view(), View::Interview);
        let after = ctl.session().messages();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(&after[..before.len()], &before[..]);
        assert_eq!(after[before.len()].text, FINISH_FAILURE_REPLY);
        assert!(ctl.session().generated_spec().is_none());
    }

    #[tokio::test]
    async fn test_finish_failure_malformed_then_retry_succeeds() {
        let mock = Arc::new(MockLlmClient::new(vec![
            Ok(text_response("hi")),
            Ok(text_response("not json at all")),
            Ok(text_response("more questions")),
            Ok(text_response(DOC_JSON)),
        ]));
        let mut ctl = controller(mock);
        ctl.start("u1", "e", "idea", ExperienceLevel::Expert, None).await.unwrap();

        assert!(ctl.finish().await.unwrap().is_none());
        let apologies = ctl
            .session()
            .messages()
            .iter()
            .filter(|m| m.text == FINISH_FAILURE_REPLY)
            .count();
        assert_eq!(apologies, 1);

        ctl.send("more detail").await.unwrap();
        assert!(ctl.finish().await.unwrap().is_some());
        assert_eq!(ctl.view(), View::Document);
    }

    #[tokio::test]
    async fn test_finish_only_from_interview() {
        let mock = Arc::new(MockLlmClient::new(vec![]));
        let mut ctl = controller(mock);
        assert_eq!(ctl.finish().await.err(), Some(InterviewError::WrongView(View::Landing)));
    }

    #[tokio::test]
    async fn test_restart_discards_everything() {
        let (mut ctl, _) = started(&["hi"]).await;
        ctl.restart();

        assert_eq!(ctl.view(), View::Landing);
        assert!(ctl.session().messages().is_empty());
        assert!(ctl.session().user_id.is_empty());
        assert_eq!(ctl.phase(), Phase::Idea);
    }

    #[tokio::test]
    async fn test_messages_ordered_by_creation() {
        let (mut ctl, _) = started(&["hi", "a", "b", "c"]).await;
        for text in ["one", "two", "three"] {
            ctl.send(text).await.unwrap();
        }
        for pair in ctl.session().messages().windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }
}
