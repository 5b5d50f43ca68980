//! Interview countdown
//!
//! A purely advisory nudge: expiry reveals the finish affordance but never ends
//! the session. The ticking task shares nothing with the rest of the program
//! except its own counter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default interview length in seconds
pub const DEFAULT_DURATION_SECS: u64 = 180;

/// Remaining time below which the surface should flag lateness
pub const LATE_THRESHOLD_SECS: u64 = 30;

/// Format seconds as `m:ss`
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Countdown state, decremented once per tick and floored at zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    total: u64,
    remaining: u64,
}

impl Countdown {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            remaining: total,
        }
    }

    /// Advance one second; returns the remaining time
    pub fn tick(&mut self) -> u64 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn expired(&self) -> bool {
        self.remaining == 0
    }
}

/// Countdown driven by a background task, one tick per second
pub struct InterviewTimer {
    total: u64,
    remaining: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl InterviewTimer {
    /// Start the countdown; must be called inside a tokio runtime
    pub fn start(total_secs: u64) -> Self {
        debug!(%total_secs, "InterviewTimer::start: called");
        let remaining = Arc::new(AtomicU64::new(total_secs));
        let counter = remaining.clone();

        let task = tokio::spawn(async move {
            let mut countdown = Countdown::new(total_secs);
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // First tick completes immediately
            interval.tick().await;

            while !countdown.expired() {
                interval.tick().await;
                counter.store(countdown.tick(), Ordering::SeqCst);
            }
            info!("Interview timer expired");
        });

        Self {
            total: total_secs,
            remaining,
            task,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn expired(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether the remaining time is low enough to flag
    pub fn is_late(&self) -> bool {
        self.remaining() < LATE_THRESHOLD_SECS
    }

    /// Remaining time as `m:ss`
    pub fn display(&self) -> String {
        format_clock(self.remaining())
    }
}

impl Drop for InterviewTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
