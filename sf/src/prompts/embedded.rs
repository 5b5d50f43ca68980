//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Interview system instruction
pub const INTERVIEW: &str = include_str!("../../prompts/interview.pmt");

/// Document extraction prompt
pub const DOCUMENT: &str = include_str!("../../prompts/document.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "interview" => {
            debug!("get_embedded: matched interview");
            Some(INTERVIEW)
        }
        "document" => {
            debug!("get_embedded: matched document");
            Some(DOCUMENT)
        }
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
