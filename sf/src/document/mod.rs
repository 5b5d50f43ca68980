//! Document view: local edits and Markdown export
//!
//! The editor works on its own copy of the generated [`SpecDocument`](crate::domain::SpecDocument);
//! nothing flows back into the session.

mod editor;
mod export;

pub use editor::{DocumentEditor, ListField, TextField};
pub use export::{export_filename, export_to, render_markdown};
