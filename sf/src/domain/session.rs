//! Interview session state

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::{ConversationMessage, ExperienceLevel, Phase, Role, SpecDocument};

/// One interview's state, discarded on restart
///
/// The message list is append-only and ordered by creation time.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub initial_idea: String,
    pub experience_level: ExperienceLevel,
    phase: Phase,
    messages: Vec<ConversationMessage>,
    generated_spec: Option<SpecDocument>,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        initial_idea: impl Into<String>,
        experience_level: ExperienceLevel,
    ) -> Self {
        let session = Self {
            user_id: user_id.into(),
            email: email.into(),
            initial_idea: initial_idea.into(),
            experience_level,
            ..Self::default()
        };
        debug!(user_id = %session.user_id, %experience_level, "Session::new: called");
        session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn generated_spec(&self) -> Option<&SpecDocument> {
        self.generated_spec.as_ref()
    }

    /// Append a message stamped with the current phase and time
    pub fn push_message(&mut self, role: Role, text: impl Into<String>) -> &ConversationMessage {
        self.push_message_at(role, text, Utc::now())
    }

    /// Append a message with an explicit timestamp
    ///
    /// The timestamp is clamped so it never precedes the previous message.
    pub fn push_message_at(&mut self, role: Role, text: impl Into<String>, at: DateTime<Utc>) -> &ConversationMessage {
        let created_at = match self.messages.last() {
            Some(last) if last.created_at > at => {
                debug!("Session::push_message_at: clock went backwards, clamping");
                last.created_at
            }
            _ => at,
        };
        let message = ConversationMessage::new(role, text, self.phase, created_at);
        debug!(id = %message.id, ?role, count = self.messages.len() + 1, "Session::push_message_at: appended");
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Explicitly set the phase
    ///
    /// No ordering is enforced here; automatic advancement goes through
    /// `interview::advance_phase`, which only moves forward.
    pub fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            info!(from = %self.phase, to = %phase, "Session phase changed");
            self.phase = phase;
        }
    }

    pub fn set_generated_spec(&mut self, spec: SpecDocument) {
        debug!(title = %spec.title, "Session::set_generated_spec: called");
        self.generated_spec = Some(spec);
    }
}
