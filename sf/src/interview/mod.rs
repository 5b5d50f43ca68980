//! Interview session state machine
//!
//! ```text
//! Landing ──start──▶ Interview ──finish──▶ Generating ──ok──▶ Document
//!                       ▲  │send/skip          │
//!                       │  ▼                   │ failed
//!                       └──┴───────────────────┘
//! ```
//!
//! Phases (`idea → users → features → flows`) advance inside `Interview` via
//! the pure [`advance_phase`] heuristic after each completed exchange.

mod augment;
mod controller;
mod phase;

pub use augment::augment_outbound;
pub use controller::{
    CONNECT_FAILURE_REPLY, FINISH_FAILURE_REPLY, InterviewController, InterviewError, SKIP_MESSAGE, TURN_FAILURE_REPLY,
    View,
};
pub use phase::{advance_phase, finish_available, turn_count};
