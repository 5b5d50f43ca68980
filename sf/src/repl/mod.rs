//! Interactive terminal surface for specforge
//!
//! Landing prompts, the timed interview with slash commands, then the
//! document view with edit and export commands.

mod session;

pub use session::{Landing, ReplSession};

use eyre::{Context, Result};
use tracing::debug;

use crate::config::Config;
use crate::gateway::ModelGateway;
use crate::interview::InterviewController;
use crate::llm::create_client;
use crate::prompts::PromptLoader;
use crate::sink::SessionSink;

/// Run the interactive interview
///
/// This is the main entry point for `sf interview`.
pub async fn run_interactive(config: &Config, landing: Landing) -> Result<()> {
    debug!(?landing, "run_interactive: called");
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;

    let project_dir = std::env::current_dir().context("Failed to read current directory")?;
    let gateway = ModelGateway::new(llm, PromptLoader::new(&project_dir), &config.llm);
    let controller = InterviewController::new(gateway, SessionSink::from_config(&config.sink));

    let mut session = ReplSession::new(
        controller,
        config.interview.duration_secs,
        config.export.output_dir.clone(),
    );
    session.run(landing).await
}
