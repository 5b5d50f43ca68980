//! Domain types for specforge
//!
//! - [`Phase`] - the four interview stages
//! - [`ExperienceLevel`] - declared user experience tier
//! - [`ConversationMessage`] - one immutable chat message
//! - [`SpecDocument`] - the structured product spec
//! - [`Session`] - one interview's mutable state

mod document;
mod level;
mod message;
mod phase;
mod session;

pub use document::SpecDocument;
pub use level::ExperienceLevel;
pub use message::ConversationMessage;
pub use phase::Phase;
pub use session::Session;

pub use crate::llm::Role;
