//! Record-to-payload conversion.
//!
//! Builds the display payload for a whole record: envelope metadata with ids
//! resolved to names, plus one JSON object per stored field of the shape
//! `{fieldName, displayValue, fieldId, <FieldType>: raw}`. Table fields nest
//! a converted object per row per column; Formula fields carry the engine's
//! computed display value instead of a stored one.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use trellis_core::{FieldType, Header, ProjectUser, Record, Value, Workflow};
use trellis_formula::{Evaluator, RowScope};

use crate::error::ConvertError;
use crate::format::display_value;
use crate::title::record_title;
use crate::tz::TzOffset;

/// Caller-supplied conversion context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions<'a> {
    /// Offset applied when formatting local date types.
    pub timezone: TzOffset,
    /// The acting user's project role, consulted by role conditions.
    pub role_id: Option<&'a str>,
}

/// The display payload for one record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reference_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub document_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub document_name: String,
    pub title: String,
    pub values: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignee_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignee_names: Vec<Option<String>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub due_date_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created_by: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_modified_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modify_date: Option<String>,
}

/// Converts a record into its display payload.
pub fn convert_record(
    record: &Record,
    workflow: &Workflow,
    users: &[ProjectUser],
    opts: &ConvertOptions<'_>,
) -> Result<ConvertedRecord, ConvertError> {
    let mut evaluator = Evaluator::new(&workflow.headers, &record.values).with_role(opts.role_id);
    let mut values = Vec::with_capacity(record.values.len());
    for value in &record.values {
        let Some(header) = workflow.headers.iter().find(|h| h.id == value.field_id) else {
            warn!(field_id = %value.field_id, "stored value has no header, skipping");
            continue;
        };
        match &header.field_type {
            FieldType::Section => continue,
            FieldType::Table => {
                values.push(table_object(value, header, &mut evaluator, opts, users)?);
            }
            _ => values.push(field_object(
                value,
                header,
                &mut evaluator,
                &RowScope::Top,
                opts,
                users,
            )?),
        }
    }

    let name_of = |user_id: &str| trellis_core::user_name(users, user_id).map(str::to_owned);
    let timestamp =
        |d: &Option<DateTime<Utc>>| d.map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true));

    Ok(ConvertedRecord {
        reference_id: record.reference_id.clone(),
        document_id: record.document_id.clone(),
        document_name: workflow.name.clone(),
        title: record_title(record, workflow, opts.timezone, users),
        values,
        assignee_ids: record.assignee_ids.clone(),
        assignee_names: record.assignee_ids.iter().map(|id| name_of(id)).collect(),
        status_id: record.status_id.clone(),
        status_name: workflow.status_name(&record.status_id).map(str::to_owned),
        due_date: timestamp(&record.due_date),
        due_date_type: record.due_date_type.clone(),
        created_by: record.created_by.clone(),
        last_modified_by: record.last_modified_by.clone(),
        created_name: name_of(&record.created_by),
        last_modified_name: name_of(&record.last_modified_by),
        create_date: timestamp(&record.create_date),
        last_modify_date: timestamp(&record.last_modify_date),
    })
}

/// Builds the `{fieldName, displayValue, fieldId, <FieldType>: raw}` object
/// for one field. For Formula fields the display value comes from the engine
/// and the raw slot carries the formula definition.
fn field_object(
    value: &Value,
    header: &Header,
    evaluator: &mut Evaluator<'_>,
    scope: &RowScope,
    opts: &ConvertOptions<'_>,
    users: &[ProjectUser],
) -> Result<serde_json::Value, ConvertError> {
    let display = display_value(value, header, opts.timezone, users)?;
    let mut object = json!({
        "fieldName": header.field_name,
        "displayValue": display.into_json(),
        "fieldId": value.field_id,
    });
    let raw = match (&header.field_type, header.config.formula.as_ref()) {
        (FieldType::Formula, Some(formula)) => {
            object["displayValue"] = evaluator.evaluate_display(formula, scope).into();
            serde_json::to_value(formula)?
        }
        _ => serde_json::to_value(&value.value)?,
    };
    object[header.field_type.as_str()] = raw;
    Ok(object)
}

/// Builds a Table field's object: one converted object per row per column.
fn table_object(
    value: &Value,
    header: &Header,
    evaluator: &mut Evaluator<'_>,
    opts: &ConvertOptions<'_>,
    users: &[ProjectUser],
) -> Result<serde_json::Value, ConvertError> {
    let rows = value.value.as_rows().unwrap_or_default();
    let mut converted_rows = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let scope = RowScope::row(header.id.clone(), index);
        let mut columns = Vec::with_capacity(row.values.len());
        for cell in &row.values {
            let Some(sub) = header.sub_header(&cell.field_id) else {
                warn!(
                    table_id = %header.id,
                    field_id = %cell.field_id,
                    "table cell has no sub-header, skipping"
                );
                continue;
            };
            columns.push(field_object(cell, sub, evaluator, &scope, opts, users)?);
        }
        converted_rows.push(serde_json::Value::Array(columns));
    }
    Ok(json!({
        "fieldName": header.field_name,
        "fieldId": value.field_id,
        "Table": converted_rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_core::{
        BinaryOp, Factor, FormulaExpr, FormulaGroup, HeaderConfig, RawValue, StatusEntry, TableRow,
    };

    fn workflow() -> Workflow {
        Workflow {
            id: "w1".into(),
            name: "orders".into(),
            headers: vec![
                Header {
                    id: "qty".into(),
                    field_name: "Quantity".into(),
                    field_type: FieldType::Number,
                    ..Header::default()
                },
                Header {
                    id: "total".into(),
                    field_name: "Total".into(),
                    field_type: FieldType::Formula,
                    config: HeaderConfig {
                        formula: Some(vec![FormulaGroup::unconditional(FormulaExpr::Binary {
                            factor_a: Factor::field("qty"),
                            op: BinaryOp::Multiply,
                            factor_b: Factor::constant(3.0),
                        })]),
                        ..HeaderConfig::default()
                    },
                    ..Header::default()
                },
                Header {
                    id: "items".into(),
                    field_name: "Items".into(),
                    field_type: FieldType::Table,
                    sub_headers: vec![Header {
                        id: "price".into(),
                        field_name: "Price".into(),
                        field_type: FieldType::Number,
                        ..Header::default()
                    }],
                    ..Header::default()
                },
            ],
            status: vec![StatusEntry {
                id: "s1".into(),
                name: "Open".into(),
            }],
            ..Workflow::default()
        }
    }

    fn record() -> Record {
        Record {
            reference_id: "r1".into(),
            document_id: "w1".into(),
            status_id: "s1".into(),
            assignee_ids: vec!["u1".into()],
            values: vec![
                Value::new("qty", RawValue::Number(5.0)),
                Value::new("total", RawValue::Null),
                Value::new(
                    "items",
                    RawValue::Rows(vec![TableRow {
                        values: vec![Value::new("price", RawValue::Number(9.5))],
                    }]),
                ),
            ],
            ..Record::default()
        }
    }

    #[test]
    fn converts_plain_field_with_raw_slot() {
        let converted = convert_record(
            &record(),
            &workflow(),
            &[],
            &ConvertOptions::default(),
        )
        .unwrap();
        let qty = &converted.values[0];
        assert_eq!(qty["fieldName"], "Quantity");
        assert_eq!(qty["fieldId"], "qty");
        assert_eq!(qty["displayValue"], "5");
        assert_eq!(qty["Number"], 5.0);
    }

    #[test]
    fn formula_field_carries_computed_display() {
        let converted = convert_record(
            &record(),
            &workflow(),
            &[],
            &ConvertOptions::default(),
        )
        .unwrap();
        let total = &converted.values[1];
        assert_eq!(total["displayValue"], "15");
        assert!(total["Formula"].is_array());
    }

    #[test]
    fn table_field_nests_converted_rows() {
        let converted = convert_record(
            &record(),
            &workflow(),
            &[],
            &ConvertOptions::default(),
        )
        .unwrap();
        let items = &converted.values[2];
        assert_eq!(items["fieldName"], "Items");
        let first_cell = &items["Table"][0][0];
        assert_eq!(first_cell["fieldName"], "Price");
        assert_eq!(first_cell["displayValue"], "9.5");
    }

    #[test]
    fn envelope_resolves_names() {
        let users = vec![ProjectUser {
            id: "u1".into(),
            name: "kevinlai".into(),
            title: String::new(),
        }];
        let converted = convert_record(
            &record(),
            &workflow(),
            &users,
            &ConvertOptions::default(),
        )
        .unwrap();
        assert_eq!(converted.document_name, "orders");
        assert_eq!(converted.status_name.as_deref(), Some("Open"));
        assert_eq!(converted.assignee_names, vec![Some("kevinlai".to_owned())]);
    }

    #[test]
    fn headerless_value_is_skipped() {
        let mut record = record();
        record.values.push(Value::new("ghost", RawValue::Number(1.0)));
        let converted = convert_record(
            &record,
            &workflow(),
            &[],
            &ConvertOptions::default(),
        )
        .unwrap();
        assert_eq!(converted.values.len(), 3);
    }
}
