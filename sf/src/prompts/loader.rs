//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::domain::{ExperienceLevel, Phase};

/// Context for the interview system instruction
#[derive(Debug, Clone, Serialize)]
pub struct InterviewPromptContext {
    pub user_id: String,
    pub idea: String,
    pub tone: String,
    /// Numbered phase descriptions, one per line
    pub phases: Vec<String>,
}

impl InterviewPromptContext {
    pub fn new(user_id: &str, idea: &str, level: ExperienceLevel) -> Self {
        debug!(%user_id, %level, "InterviewPromptContext::new: called");
        let phases = Phase::ALL
            .iter()
            .map(|p| format!("{}. {}: {}", p.index() + 1, p.label(), phase_goal(*p)))
            .collect();
        Self {
            user_id: user_id.to_string(),
            idea: idea.to_string(),
            tone: level.tone().to_string(),
            phases,
        }
    }
}

/// What the interviewer should get out of each phase
fn phase_goal(phase: Phase) -> &'static str {
    match phase {
        Phase::Idea => "Clarify the core problem.",
        Phase::Users => "Define personas and the main outcome/value prop.",
        Phase::Features => "List 3-5 distinct features.",
        Phase::Flows => "Walk through the \"Happy Path\" user flow.",
    }
}

/// Context for the document extraction prompt
#[derive(Debug, Clone, Serialize)]
pub struct DocumentPromptContext {
    pub idea: String,
    /// Role-prefixed transcript, one message per line
    pub conversation: String,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directories, searched in order
    dirs: Vec<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at `project_dir`
    ///
    /// Looks in `{project_dir}/.specforge/prompts/` and the user config dir.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        let project_dir = project_dir.as_ref();
        debug!(?project_dir, "PromptLoader::new: called");
        let mut candidates = vec![project_dir.join(".specforge/prompts")];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("specforge").join("prompts"));
        }

        let dirs = candidates
            .into_iter()
            .filter(|d| {
                let exists = d.exists();
                debug!(dir = ?d, %exists, "PromptLoader::new: checking directory");
                exists
            })
            .collect();

        Self { hbs: engine(), dirs }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: engine(),
            dirs: Vec::new(),
        }
    }

    /// Load a template by name, override directories first
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in &self.dirs {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        debug!("PromptLoader::load_template: trying embedded fallback");
        if let Some(content) = embedded::get_embedded(name) {
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the interview system instruction
    pub fn interview_prompt(&self, context: &InterviewPromptContext) -> Result<String> {
        self.render("interview", context)
    }

    /// Render the document extraction prompt
    pub fn document_prompt(&self, context: &DocumentPromptContext) -> Result<String> {
        self.render("document", context)
    }
}

/// Handlebars engine configured for plain-text prompts (no HTML escaping)
fn engine() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(handlebars::no_escape);
    hbs
}
