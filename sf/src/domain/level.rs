//! Declared experience tier

use serde::{Deserialize, Serialize};
use tracing::debug;

/// How experienced the interviewee says they are
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    #[default]
    Intermediate,
    Expert,
}

impl ExperienceLevel {
    /// Tone descriptor embedded in the interview instruction
    pub fn tone(&self) -> &'static str {
        debug!(?self, "ExperienceLevel::tone: called");
        match self {
            ExperienceLevel::Beginner => "encouraging, educational, and guiding",
            ExperienceLevel::Intermediate => "professional and structured",
            ExperienceLevel::Expert => "concise, technical, and direct",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Expert => "expert",
        }
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "b" => Ok(ExperienceLevel::Beginner),
            "intermediate" | "i" => Ok(ExperienceLevel::Intermediate),
            "expert" | "e" => Ok(ExperienceLevel::Expert),
            _ => Err(format!(
                "Unknown experience level: {}. Use beginner, intermediate, or expert",
                s
            )),
        }
    }
}
