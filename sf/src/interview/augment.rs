//! Outbound message augmentation
//!
//! The stored message is always the user's text; only the wire copy carries the
//! steering note.

use crate::domain::Phase;

/// Wire text for a user message: the original text plus a hidden phase note
pub fn augment_outbound(text: &str, phase: Phase) -> String {
    format!(
        "{}\n[SYSTEM_NOTE: Current Phase: {}. Keep strictly to the 3-minute limit. \
         If you have enough info for this phase, move to next. If phase is validation, wrap up.]",
        text,
        phase.label()
    )
}
