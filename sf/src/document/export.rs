//! Markdown rendering and file export

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use eyre::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::domain::SpecDocument;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

fn bullets(items: &[String]) -> String {
    items.iter().map(|item| format!("- {}", item)).collect::<Vec<_>>().join("\n")
}

/// Render a spec as Markdown
///
/// Identical input always yields byte-identical output. An empty list leaves
/// an empty block under its header.
pub fn render_markdown(doc: &SpecDocument) -> String {
    debug!(title = %doc.title, "render_markdown: called");
    let md = format!(
        "\n# {title}\n\n\
         ## Summary\n{summary}\n\n\
         ## Problem Statement\n{problem}\n\n\
         ## Target Users\n{users}\n\n\
         ## Value Proposition\n{value}\n\n\
         ## Key Features\n{features}\n\n\
         ## User Stories\n{stories}\n\n\
         ## Constraints & Notes\n{notes}\n",
        title = doc.title,
        summary = doc.summary,
        problem = doc.problem_statement,
        users = bullets(&doc.target_users),
        value = doc.value_proposition,
        features = bullets(&doc.key_features),
        stories = bullets(&doc.user_stories),
        notes = bullets(&doc.constraints_and_notes),
    );
    md.trim().to_string()
}

/// File name for an exported spec: whitespace runs become `_`, then lowercased
pub fn export_filename(title: &str) -> String {
    format!("{}_spec.md", WHITESPACE.replace_all(title, "_").to_lowercase())
}

/// Reduce a file name to a single path component
///
/// Separators become `_` and `..` runs collapse, so the result always lands
/// directly inside the export directory.
fn confine_file_name(name: &str) -> String {
    let flat: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
        .collect();
    let flat = flat.replace("..", "_");
    match flat.trim_start_matches('.') {
        "" => "untitled_spec.md".to_string(),
        rest => rest.to_string(),
    }
}

/// Write the rendered spec into `dir`, returning the written path
pub fn export_to(dir: &Path, doc: &SpecDocument) -> Result<PathBuf> {
    debug!(dir = %dir.display(), "export_to: called");
    fs::create_dir_all(dir).context("Failed to create export directory")?;

    let path = dir.join(confine_file_name(&export_filename(&doc.title)));
    fs::write(&path, render_markdown(doc)).with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), "Exported spec");
    Ok(path)
}
