//! Record -- one stored document of field values for a workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A record: field values keyed by a workflow's headers, plus envelope
/// metadata (authorship, status, scheduling).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reference_id: String,

    /// The workflow this record belongs to.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub document_id: String,

    pub values: Vec<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignee_ids: Vec<String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub status_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub due_date_type: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub created_by: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_modified_by: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modify_date: Option<DateTime<Utc>>,
}

impl Record {
    /// The top-level value for a field id, if stored.
    pub fn value(&self, field_id: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.field_id == field_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RawValue;

    #[test]
    fn decode_minimal_record() {
        let json = r#"{
            "referenceId": "r1",
            "documentId": "w1",
            "values": [{"fieldId": "f1", "value": "hello"}]
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.values.len(), 1);
        assert_eq!(
            record.value("f1").unwrap().value,
            RawValue::Text("hello".into())
        );
        assert!(record.value("f2").is_none());
    }
}
