//! Workflow schema envelope: headers plus the metadata a record references.

use serde::{Deserialize, Serialize};

use crate::header::Header;

/// A workflow definition: the schema a record's values are keyed by.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workflow {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    pub headers: Vec<Header>,

    /// Selectable workflow statuses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<StatusEntry>,

    /// Record title template with `{{fieldId}}` placeholders.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub record_title_format_string: String,
}

impl Workflow {
    /// The status name for an id, if configured.
    pub fn status_name(&self, status_id: &str) -> Option<&str> {
        self.status
            .iter()
            .find(|s| s.id == status_id)
            .map(|s| s.name.as_str())
    }
}

/// One selectable workflow status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusEntry {
    pub id: String,
    pub name: String,
}

/// A project member, used to resolve user-field ids to display names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectUser {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
}

/// Finds a user's display name by id.
pub fn user_name<'a>(users: &'a [ProjectUser], user_id: &str) -> Option<&'a str> {
    users
        .iter()
        .find(|u| u.id == user_id)
        .map(|u| u.name.as_str())
}
