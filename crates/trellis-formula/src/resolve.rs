//! Header and raw-value lookup.
//!
//! Lookups never fail hard: formulas may reference fields that were deleted
//! from the schema after the formula was authored, so absence is a normal,
//! representable outcome (`None`).

use trellis_core::{Header, RawValue, Value};

/// Identifies where an evaluation is scoped: the record's top level, or one
/// row of a Table field (needed so a formula inside a table can reference
/// sibling columns within the same row).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowScope {
    Top,
    Row { table_id: String, index: usize },
}

impl RowScope {
    pub fn row(table_id: impl Into<String>, index: usize) -> Self {
        Self::Row {
            table_id: table_id.into(),
            index,
        }
    }
}

/// Finds the header for a field id, descending into one level of Table
/// sub-headers. A matching sub-header wins over its parent table.
pub fn header_by_id<'a>(field_id: &str, headers: &'a [Header]) -> Option<&'a Header> {
    if field_id.is_empty() {
        return None;
    }
    for header in headers {
        if header.field_type.is_table() {
            if let Some(sub) = header.sub_header(field_id) {
                return Some(sub);
            }
        }
        if header.id == field_id {
            return Some(header);
        }
    }
    None
}

/// Same search keyed by display name; the fallback when a factor carries no
/// field id.
pub fn header_by_name<'a>(field_name: &str, headers: &'a [Header]) -> Option<&'a Header> {
    if field_name.is_empty() {
        return None;
    }
    for header in headers {
        if header.field_type.is_table() {
            if let Some(sub) = header.sub_headers.iter().find(|sh| sh.field_name == field_name) {
                return Some(sub);
            }
        }
        if header.field_name == field_name {
            return Some(header);
        }
    }
    None
}

/// The Table header that contains the given sub-header id, if any.
pub fn parent_table_of<'a>(sub_id: &str, headers: &'a [Header]) -> Option<&'a Header> {
    headers
        .iter()
        .filter(|h| h.field_type.is_table())
        .find(|h| h.sub_header(sub_id).is_some())
}

/// Looks up the raw stored value for a field id under a row scope.
///
/// Sub-fields resolve only inside their own table's row context; top-level
/// fields resolve from any scope. A sub-field referenced without a matching
/// row context yields `None`.
pub fn raw_value<'a>(
    field_id: &str,
    scope: &RowScope,
    headers: &[Header],
    values: &'a [Value],
) -> Option<&'a RawValue> {
    let parent = parent_table_of(field_id, headers);
    match (parent, scope) {
        (Some(table), RowScope::Row { table_id, index }) if table.id == *table_id => {
            let rows = values
                .iter()
                .find(|v| v.field_id == *table_id)?
                .value
                .as_rows()?;
            rows.get(*index)?
                .values
                .iter()
                .find(|v| v.field_id == field_id)
                .map(|v| &v.value)
        }
        (Some(_), _) => None,
        (None, _) => values
            .iter()
            .find(|v| v.field_id == field_id)
            .map(|v| &v.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{FieldType, TableRow};

    fn table_schema() -> Vec<Header> {
        vec![
            Header {
                id: "n1".into(),
                field_name: "Amount".into(),
                field_type: FieldType::Number,
                ..Header::default()
            },
            Header {
                id: "t1".into(),
                field_name: "Items".into(),
                field_type: FieldType::Table,
                sub_headers: vec![Header {
                    id: "c1".into(),
                    field_name: "Qty".into(),
                    field_type: FieldType::Number,
                    ..Header::default()
                }],
                ..Header::default()
            },
        ]
    }

    fn table_values() -> Vec<Value> {
        vec![
            Value::new("n1", RawValue::Number(5.0)),
            Value::new(
                "t1",
                RawValue::Rows(vec![
                    TableRow {
                        values: vec![Value::new("c1", RawValue::Number(10.0))],
                    },
                    TableRow {
                        values: vec![Value::new("c1", RawValue::Number(20.0))],
                    },
                ]),
            ),
        ]
    }

    #[test]
    fn header_by_id_finds_sub_header() {
        let headers = table_schema();
        assert_eq!(header_by_id("c1", &headers).unwrap().field_name, "Qty");
        assert_eq!(header_by_id("t1", &headers).unwrap().field_name, "Items");
        assert!(header_by_id("missing", &headers).is_none());
        assert!(header_by_id("", &headers).is_none());
    }

    #[test]
    fn header_by_name_fallback() {
        let headers = table_schema();
        assert_eq!(header_by_name("Amount", &headers).unwrap().id, "n1");
        assert_eq!(header_by_name("Qty", &headers).unwrap().id, "c1");
        assert!(header_by_name("Nope", &headers).is_none());
    }

    #[test]
    fn parent_table_lookup() {
        let headers = table_schema();
        assert_eq!(parent_table_of("c1", &headers).unwrap().id, "t1");
        assert!(parent_table_of("n1", &headers).is_none());
    }

    #[test]
    fn raw_value_top_level() {
        let headers = table_schema();
        let values = table_values();
        assert_eq!(
            raw_value("n1", &RowScope::Top, &headers, &values),
            Some(&RawValue::Number(5.0))
        );
    }

    #[test]
    fn raw_value_in_row_scope() {
        let headers = table_schema();
        let values = table_values();
        let scope = RowScope::row("t1", 1);
        assert_eq!(
            raw_value("c1", &scope, &headers, &values),
            Some(&RawValue::Number(20.0))
        );
        // Top-level fields stay reachable from a row scope.
        assert_eq!(
            raw_value("n1", &scope, &headers, &values),
            Some(&RawValue::Number(5.0))
        );
    }

    #[test]
    fn sub_field_without_row_context_is_none() {
        let headers = table_schema();
        let values = table_values();
        assert!(raw_value("c1", &RowScope::Top, &headers, &values).is_none());
        // Out-of-range row index.
        assert!(raw_value("c1", &RowScope::row("t1", 9), &headers, &values).is_none());
        // Wrong table context.
        assert!(raw_value("c1", &RowScope::row("t2", 0), &headers, &values).is_none());
    }
}
