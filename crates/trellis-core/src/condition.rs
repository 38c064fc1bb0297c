//! Formula branch conditions.
//!
//! A condition is a disjunction of conjunctions: it holds iff at least one
//! inner AND-group has all of its clauses true. An `elseTo` condition marks
//! the fallback branch; it never matches positively and is selected only
//! when every other branch has failed.

use serde::{Deserialize, Serialize};

use crate::field_type::CompareOp;
use crate::value::RawValue;

/// Guard condition of one formula variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    /// Marks the else/fallback branch.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub else_to: bool,

    /// OR of AND-groups.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Vec<AndClause>>,
}

impl Condition {
    /// A fallback condition (`elseTo: true`, no clauses).
    pub fn else_branch() -> Self {
        Self {
            else_to: true,
            conditions: Vec::new(),
        }
    }
}

/// One clause inside an AND-group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "referenceType", content = "reference")]
pub enum AndClause {
    /// Compare a field's current value against a configured value.
    #[serde(rename = "field-value")]
    FieldValue(FieldValueRef),

    /// Test whether a field's effective value is blank.
    #[serde(rename = "field-empty")]
    FieldEmpty(FieldEmptyRef),

    /// Compare a configured role id against the caller's current role.
    #[serde(rename = "project-role")]
    ProjectRole(ProjectRoleRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValueRef {
    pub field_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<CompareOp>,

    /// The comparison value; interpretation depends on the field's type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RawValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEmptyRef {
    pub field_id: String,

    /// `true` expects the field to be blank; `false` expects content.
    #[serde(default)]
    pub is_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRoleRef {
    pub project_role_id: String,
}
