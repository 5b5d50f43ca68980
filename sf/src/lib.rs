//! specforge - guided product interview that produces a structured spec
//!
//! A short, timed interview with a generation service walks the user through
//! four phases (idea, users, features, happy path). The transcript is then
//! turned into a [`SpecDocument`] via a schema-constrained call, which can be
//! edited and exported as Markdown.

pub mod cli;
pub mod config;
pub mod document;
pub mod domain;
pub mod gateway;
pub mod interview;
pub mod llm;
pub mod prompts;
pub mod repl;
pub mod sink;
pub mod timer;

pub use config::Config;
pub use document::{DocumentEditor, export_filename, export_to, render_markdown};
pub use domain::{ConversationMessage, ExperienceLevel, Phase, Session, SpecDocument};
pub use gateway::{ConversationHandle, GatewayError, ModelGateway};
pub use interview::{InterviewController, View};
pub use llm::{GeminiClient, LlmClient, LlmError, create_client};
pub use timer::InterviewTimer;
