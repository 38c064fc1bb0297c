//! Per-field-type display strings.
//!
//! Every field type formats to a string (or a string per element for multi
//! fields). Unformattable content degrades to the empty string; the only
//! fatal condition is a value paired with the wrong header.

use chrono::SecondsFormat;

use trellis_core::{FieldType, Header, ProjectUser, RawValue, Value, user_name};
use trellis_formula::format_number;

use crate::error::ConvertError;
use crate::tz::TzOffset;

/// A formatted field value: one string, or one per element for multi fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayValue {
    One(String),
    Many(Vec<String>),
}

impl DisplayValue {
    /// The single display string, if this is not a multi value.
    pub fn single(&self) -> Option<&str> {
        match self {
            Self::One(s) => Some(s),
            Self::Many(_) => None,
        }
    }

    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::One(s) => serde_json::Value::String(s),
            Self::Many(items) => items.into_iter().map(serde_json::Value::from).collect(),
        }
    }
}

/// Formats a stored value for display under its header's field type.
///
/// The value's field id must reference the given header; a mismatch is the
/// one fatal conversion error.
pub fn display_value(
    value: &Value,
    header: &Header,
    tz: TzOffset,
    users: &[ProjectUser],
) -> Result<DisplayValue, ConvertError> {
    if value.field_id != header.id {
        return Err(ConvertError::HeaderIdMismatch {
            field_id: value.field_id.clone(),
            header_id: header.id.clone(),
        });
    }
    Ok(match &value.value {
        RawValue::List(items) => DisplayValue::Many(
            items
                .iter()
                .map(|item| scalar_display(item, header, tz, users))
                .collect(),
        ),
        raw => DisplayValue::One(scalar_display(raw, header, tz, users)),
    })
}

/// Formats one scalar element under the header's field type.
fn scalar_display(raw: &RawValue, header: &Header, tz: TzOffset, users: &[ProjectUser]) -> String {
    match &header.field_type {
        FieldType::DateTime => {
            let Some(instant) = raw.as_datetime() else {
                return String::new();
            };
            let date_type = header.date_type();
            let shown = if date_type.is_local() {
                tz.to_local(instant)
            } else {
                instant
            };
            shown.format(date_type.format_str()).to_string()
        }
        FieldType::Boolean => match raw {
            RawValue::Bool(b) => b.to_string(),
            other => common_display(other),
        },
        FieldType::Set => match raw.as_text() {
            // Falls back to the stored value for free-text ("other") entries.
            Some(id) => header.config.option_label(id).unwrap_or(id).to_owned(),
            None => String::new(),
        },
        FieldType::Image | FieldType::File => match raw {
            RawValue::File(f) => f.identifier(),
            _ => String::new(),
        },
        FieldType::AutoId => auto_id_display(raw, header),
        FieldType::User => match raw.as_text() {
            Some(id) => user_name(users, id).unwrap_or(id).to_owned(),
            None => String::new(),
        },
        _ => common_display(raw),
    }
}

/// `prefix` + running number, zero-padded to the configured digit count.
fn auto_id_display(raw: &RawValue, header: &Header) -> String {
    let RawValue::AutoId(auto_id) = raw else {
        return String::new();
    };
    let Some(number) = auto_id.value else {
        return String::new();
    };
    let digit = header
        .config
        .auto_id_prefixes
        .iter()
        .find(|p| p.prefix == auto_id.prefix)
        .and_then(|p| p.digit);
    match digit {
        Some(width) => format!("{}{number:0width$}", auto_id.prefix),
        None => format!("{}{number}", auto_id.prefix),
    }
}

/// Plain stringification for types without dedicated display rules.
fn common_display(raw: &RawValue) -> String {
    match raw {
        RawValue::Null => String::new(),
        RawValue::Number(n) => format_number(*n),
        RawValue::Bool(b) => b.to_string(),
        RawValue::Text(s) => s.clone(),
        RawValue::DateTime(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
        // Structured shapes have no common string form.
        RawValue::AutoId(_) | RawValue::File(_) | RawValue::Rows(_) | RawValue::List(_) => {
            String::new()
        }
    }
}
