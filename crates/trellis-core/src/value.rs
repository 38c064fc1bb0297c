//! Stored record values.
//!
//! A record is a flat list of [`Value`]s keyed by header id. Wire data is
//! dynamically typed, so [`RawValue`] decodes the JSON shape once at the
//! model boundary; the engine and formatters then match on a closed enum.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// One stored datum for a field within a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    /// References a `Header` id (or a table sub-header id inside a row).
    pub field_id: String,

    #[serde(default)]
    pub value: RawValue,
}

impl Value {
    pub fn new(field_id: impl Into<String>, value: RawValue) -> Self {
        Self {
            field_id: field_id.into(),
            value,
        }
    }
}

/// An AutoId datum: a configured prefix plus a running number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoIdValue {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub value: Option<i64>,
}

/// A file/image datum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValue {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_type: String,
}

impl FileValue {
    /// The display identifier, `fileName.fileType`.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.file_name, self.file_type)
    }
}

/// One row of a Table field: an ordered list of sub-field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Dynamically typed record value, decoded from its JSON shape.
///
/// Timestamps are stored as RFC 3339 strings on the wire; any string that
/// parses as one decodes to `DateTime`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    #[default]
    Null,
    Number(f64),
    Bool(bool),
    Text(String),
    DateTime(DateTime<Utc>),
    AutoId(AutoIdValue),
    File(FileValue),
    /// Rows of a Table field.
    Rows(Vec<TableRow>),
    /// Multi-valued field payload.
    List(Vec<RawValue>),
}

impl RawValue {
    /// Returns `true` when the value carries no displayable content.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Rows(rows) => rows.is_empty(),
            _ => false,
        }
    }

    /// Numeric view, if this value is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Timestamp view, if this value is a datetime.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(d) => Some(*d),
            _ => None,
        }
    }

    /// Text view, if this value is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Table rows view, if this value holds rows.
    pub fn as_rows(&self) -> Option<&[TableRow]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Text(s) => serializer.serialize_str(s),
            Self::DateTime(d) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Self::AutoId(a) => a.serialize(serializer),
            Self::File(f) => f.serialize(serializer),
            Self::Rows(rows) => rows.serialize(serializer),
            Self::List(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        decode(&json).map_err(de::Error::custom)
    }
}

/// Decodes a JSON shape into a typed raw value.
fn decode(json: &serde_json::Value) -> Result<RawValue, String> {
    use serde_json::Value as Json;
    match json {
        Json::Null => Ok(RawValue::Null),
        Json::Bool(b) => Ok(RawValue::Bool(*b)),
        Json::Number(n) => n
            .as_f64()
            .map(RawValue::Number)
            .ok_or_else(|| format!("unrepresentable number: {n}")),
        Json::String(s) => Ok(match DateTime::parse_from_rfc3339(s) {
            Ok(d) => RawValue::DateTime(d.with_timezone(&Utc)),
            Err(_) => RawValue::Text(s.clone()),
        }),
        Json::Array(items) => {
            // An array of `{values: [...]}` objects is a table's row list;
            // anything else is a multi-value payload.
            let is_rows = !items.is_empty()
                && items
                    .iter()
                    .all(|i| i.as_object().is_some_and(|o| o.contains_key("values")));
            if is_rows {
                let rows = items
                    .iter()
                    .map(|i| {
                        serde_json::from_value::<TableRow>(i.clone()).map_err(|e| e.to_string())
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RawValue::Rows(rows))
            } else {
                let list = items.iter().map(decode).collect::<Result<Vec<_>, _>>()?;
                Ok(RawValue::List(list))
            }
        }
        Json::Object(obj) => {
            if obj.contains_key("prefix") {
                serde_json::from_value::<AutoIdValue>(json.clone())
                    .map(RawValue::AutoId)
                    .map_err(|e| e.to_string())
            } else if obj.contains_key("fileName") {
                serde_json::from_value::<FileValue>(json.clone())
                    .map(RawValue::File)
                    .map_err(|e| e.to_string())
            } else {
                Err(format!("unrecognised value shape: {json}"))
            }
        }
    }
}
