//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the interview and the
//! document extraction call.
//!
//! Template loading chain:
//! 1. `.specforge/prompts/{name}.pmt` (project override)
//! 2. `~/.config/specforge/prompts/{name}.pmt` (user override)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{DocumentPromptContext, InterviewPromptContext, PromptLoader};
