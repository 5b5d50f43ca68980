//! Interview phases

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One stage of the fixed four-stage interview
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idea,
    Users,
    Features,
    Flows,
}

impl Phase {
    /// All phases in interview order
    pub const ALL: [Phase; 4] = [Phase::Idea, Phase::Users, Phase::Features, Phase::Flows];

    /// Display label shown in the progress line
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idea => "Idea & Goals",
            Phase::Users => "Users & Value",
            Phase::Features => "Core Features",
            Phase::Flows => "Happy Path",
        }
    }

    /// Target duration hint for the phase
    pub fn duration_hint(&self) -> &'static str {
        "~45s"
    }

    /// Zero-based position in [`Phase::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Phase::Idea => 0,
            Phase::Users => 1,
            Phase::Features => 2,
            Phase::Flows => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idea => "idea",
            Phase::Users => "users",
            Phase::Features => "features",
            Phase::Flows => "flows",
        }
    }

    /// Whether this is the last phase
    pub fn is_final(&self) -> bool {
        *self == Phase::Flows
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "Phase::from_str: called");
        match s.to_lowercase().as_str() {
            "idea" => Ok(Phase::Idea),
            "users" => Ok(Phase::Users),
            "features" => Ok(Phase::Features),
            "flows" => Ok(Phase::Flows),
            _ => Err(format!("Unknown phase: {}. Use idea, users, features, or flows", s)),
        }
    }
}
