//! DocumentEditor - in-place edits on a copy of the spec

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::domain::SpecDocument;

/// Free-text fields of a spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Summary,
    ProblemStatement,
    ValueProposition,
}

/// Bulleted-list fields of a spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    TargetUsers,
    KeyFeatures,
    UserStories,
    ConstraintsAndNotes,
}

impl ListField {
    pub const ALL: [ListField; 4] = [
        ListField::TargetUsers,
        ListField::KeyFeatures,
        ListField::UserStories,
        ListField::ConstraintsAndNotes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListField::TargetUsers => "users",
            ListField::KeyFeatures => "features",
            ListField::UserStories => "stories",
            ListField::ConstraintsAndNotes => "notes",
        }
    }
}

impl fmt::Display for ListField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ListField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "users" | "target-users" => Ok(ListField::TargetUsers),
            "features" | "key-features" => Ok(ListField::KeyFeatures),
            "stories" | "user-stories" => Ok(ListField::UserStories),
            "notes" | "constraints" => Ok(ListField::ConstraintsAndNotes),
            _ => Err(format!(
                "Unknown list '{}'. Expected one of: users, features, stories, notes",
                s
            )),
        }
    }
}

/// Editable copy of a generated spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEditor {
    doc: SpecDocument,
}

impl DocumentEditor {
    pub fn new(doc: SpecDocument) -> Self {
        debug!(title = %doc.title, "DocumentEditor::new: called");
        Self { doc }
    }

    pub fn document(&self) -> &SpecDocument {
        &self.doc
    }

    pub fn set_text(&mut self, field: TextField, value: impl Into<String>) {
        let value = value.into();
        debug!(?field, len = value.len(), "set_text: called");
        let slot = match field {
            TextField::Title => &mut self.doc.title,
            TextField::Summary => &mut self.doc.summary,
            TextField::ProblemStatement => &mut self.doc.problem_statement,
            TextField::ValueProposition => &mut self.doc.value_proposition,
        };
        *slot = value;
    }

    pub fn items(&self, field: ListField) -> &[String] {
        match field {
            ListField::TargetUsers => &self.doc.target_users,
            ListField::KeyFeatures => &self.doc.key_features,
            ListField::UserStories => &self.doc.user_stories,
            ListField::ConstraintsAndNotes => &self.doc.constraints_and_notes,
        }
    }

    pub fn set_items(&mut self, field: ListField, items: Vec<String>) {
        debug!(%field, count = items.len(), "set_items: called");
        *self.list_mut(field) = items;
    }

    pub fn push_item(&mut self, field: ListField, item: impl Into<String>) {
        debug!(%field, "push_item: called");
        self.list_mut(field).push(item.into());
    }

    /// Remove the item at `index`, returning it if it existed
    pub fn remove_item(&mut self, field: ListField, index: usize) -> Option<String> {
        debug!(%field, %index, "remove_item: called");
        let list = self.list_mut(field);
        (index < list.len()).then(|| list.remove(index))
    }

    fn list_mut(&mut self, field: ListField) -> &mut Vec<String> {
        match field {
            ListField::TargetUsers => &mut self.doc.target_users,
            ListField::KeyFeatures => &mut self.doc.key_features,
            ListField::UserStories => &mut self.doc.user_stories,
            ListField::ConstraintsAndNotes => &mut self.doc.constraints_and_notes,
        }
    }
}
