//! specforge - guided product interview
//!
//! CLI entry point: interview REPL plus small offline helpers.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{debug, info};

use specforge::cli::{Cli, Command, generate_after_help};
use specforge::config::Config;
use specforge::document::{export_to, render_markdown};
use specforge::domain::SpecDocument;
use specforge::gateway::schema::spec_schema;
use specforge::repl::{self, Landing};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("specforge")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("specforge.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        "specforge loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );
    config.warn_if_unconfigured();

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Interview {
            user,
            email,
            idea,
            level,
        }) => {
            let landing = Landing {
                user_id: user,
                email,
                idea,
                level,
            };
            repl::run_interactive(&config, landing).await
        }
        None => repl::run_interactive(&config, Landing::default()).await,
        Some(Command::Schema) => cmd_schema(),
        Some(Command::Render { input, output }) => cmd_render(&input, output.as_deref()),
        Some(Command::Config) => cmd_config(&config),
    }
}

fn cmd_schema() -> Result<()> {
    debug!("cmd_schema: called");
    let schema = serde_json::to_string_pretty(&spec_schema()).context("Failed to serialize schema")?;
    println!("{}", schema);
    Ok(())
}

fn cmd_render(input: &Path, output: Option<&Path>) -> Result<()> {
    debug!(?input, ?output, "cmd_render: called");
    let content = fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let doc: SpecDocument =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse spec JSON in {}", input.display()))?;

    match output {
        Some(dir) => {
            let path = export_to(dir, &doc)?;
            println!("{}", path.display());
        }
        None => println!("{}", render_markdown(&doc)),
    }
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}
