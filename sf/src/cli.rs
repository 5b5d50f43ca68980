//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::ExperienceLevel;

/// specforge - turn an app idea into a product spec in a short interview
#[derive(Parser)]
#[command(
    name = "sf",
    about = "Guided product interview that produces a structured spec",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `interview`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the interactive interview
    Interview {
        /// User identifier (prompted if omitted)
        #[arg(short, long)]
        user: Option<String>,

        /// Contact email (prompted if omitted)
        #[arg(short, long)]
        email: Option<String>,

        /// App idea in one sentence (prompted if omitted)
        #[arg(short, long)]
        idea: Option<String>,

        /// Experience level: beginner, intermediate, expert
        #[arg(long)]
        level: Option<ExperienceLevel>,
    },

    /// Print the JSON schema used for spec generation
    Schema,

    /// Render a saved spec JSON file to Markdown
    Render {
        /// Path to a spec JSON file
        #[arg(value_name = "JSON")]
        input: PathBuf,

        /// Write `<title>_spec.md` into this directory instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("specforge")
        .join("logs")
        .join("specforge.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// After-help text pointing at the log file
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}
