//! Phase advancement heuristic
//!
//! Pure functions, no I/O: the controller calls [`advance_phase`] after every
//! completed exchange.

use tracing::debug;

use crate::domain::Phase;

/// Completed exchanges implied by a message count
pub fn turn_count(message_count: usize) -> usize {
    message_count / 2
}

/// Next phase for the given turn count
///
/// Moves at most one step forward and never backwards. `Flows` only ends via
/// the explicit finish action.
pub fn advance_phase(phase: Phase, turn_count: usize) -> Phase {
    let next = match phase {
        Phase::Idea if turn_count > 2 => Phase::Users,
        Phase::Users if turn_count > 5 => Phase::Features,
        Phase::Features if turn_count > 8 => Phase::Flows,
        current => current,
    };
    debug!(%phase, %turn_count, %next, "advance_phase: computed");
    next
}

/// Whether the "generate document" affordance should be shown
///
/// Reaching the final phase and running out of time are independent triggers.
pub fn finish_available(phase: Phase, timer_expired: bool) -> bool {
    phase.is_final() || timer_expired
}
