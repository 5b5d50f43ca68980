//! The structured product specification

use serde::{Deserialize, Serialize};

/// Product spec extracted from an interview
///
/// Field names on the wire are camelCase to match the response schema.
/// `constraintsAndNotes` is the only optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDocument {
    pub title: String,
    pub summary: String,
    pub problem_statement: String,
    pub target_users: Vec<String>,
    pub value_proposition: String,
    pub key_features: Vec<String>,
    pub user_stories: Vec<String>,
    #[serde(default)]
    pub constraints_and_notes: Vec<String>,
}
