//! Response schema for document extraction
//!
//! Uses the OpenAPI-style subset the generation service accepts for
//! `responseSchema` (uppercase type names).

use serde_json::{Value, json};

/// Wire names of the document fields, in schema order
pub const FIELDS: [&str; 8] = [
    "title",
    "summary",
    "problemStatement",
    "targetUsers",
    "valueProposition",
    "keyFeatures",
    "userStories",
    "constraintsAndNotes",
];

/// Fields the model must always return (all but the last)
pub const REQUIRED: [&str; 7] = [
    "title",
    "summary",
    "problemStatement",
    "targetUsers",
    "valueProposition",
    "keyFeatures",
    "userStories",
];

fn string_field(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn list_field(description: &str) -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" }, "description": description })
}

/// Schema for the structured spec document
pub fn spec_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": string_field("A catchy product name"),
            "summary": string_field("2-3 sentence executive summary"),
            "problemStatement": string_field("Clear definition of the problem being solved"),
            "targetUsers": list_field("List of user personas"),
            "valueProposition": string_field("The main value add for the user"),
            "keyFeatures": list_field("List of 3-7 core features"),
            "userStories": list_field("User stories in 'As a... I want to... So that...' format"),
            "constraintsAndNotes": list_field("Technical constraints, edge cases, or open questions"),
        },
        "required": REQUIRED,
    })
}
