//! Conversation messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{Phase, Role};

/// One message in the interview, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Phase the session was in when the message was created
    pub phase: Phase,
}

impl ConversationMessage {
    pub fn new(role: Role, text: impl Into<String>, phase: Phase, created_at: DateTime<Utc>) -> Self {
        let id = Uuid::now_v7().to_string();
        debug!(%id, ?role, %phase, "ConversationMessage::new: called");
        Self {
            id,
            role,
            text: text.into(),
            created_at,
            phase,
        }
    }

    /// Uppercase role prefix used in flattened transcripts
    pub fn role_tag(&self) -> &'static str {
        match self.role {
            Role::Assistant => "ASSISTANT",
            Role::User => "USER",
        }
    }
}
