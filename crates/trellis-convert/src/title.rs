//! Record title templating.
//!
//! A workflow's title format string references fields by `{{fieldId}}`.
//! Each placeholder substitutes the field's display value; placeholders that
//! reference unknown fields, multi fields or Table fields substitute empty.

use trellis_core::{ProjectUser, Record, Workflow};

use crate::format::display_value;
use crate::tz::TzOffset;

/// Renders a record's title from its workflow's title format string.
pub fn record_title(
    record: &Record,
    workflow: &Workflow,
    tz: TzOffset,
    users: &[ProjectUser],
) -> String {
    let template = workflow.record_title_format_string.as_str();
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some(end) = rest[start + 2..].find("}}") else {
            // Unterminated placeholder: keep the remainder verbatim.
            break;
        };
        let key = &rest[start + 2..start + 2 + end];
        result.push_str(&rest[..start]);
        result.push_str(&placeholder_value(key, record, workflow, tz, users));
        rest = &rest[start + 2 + end + 2..];
    }
    result.push_str(rest);
    result
}

fn placeholder_value(
    key: &str,
    record: &Record,
    workflow: &Workflow,
    tz: TzOffset,
    users: &[ProjectUser],
) -> String {
    let Some(value) = record.value(key) else {
        return String::new();
    };
    let Some(header) = workflow.headers.iter().find(|h| h.id == key) else {
        return String::new();
    };
    if header.is_multi || header.field_type.is_table() {
        return String::new();
    }
    match display_value(value, header, tz, users) {
        Ok(display) => display.single().unwrap_or("").to_owned(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_core::{FieldType, Header, RawValue, Value};

    fn fixture(template: &str) -> (Record, Workflow) {
        let workflow = Workflow {
            headers: vec![
                Header {
                    id: "name".into(),
                    field_name: "Name".into(),
                    field_type: FieldType::String,
                    ..Header::default()
                },
                Header {
                    id: "qty".into(),
                    field_name: "Quantity".into(),
                    field_type: FieldType::Number,
                    ..Header::default()
                },
                Header {
                    id: "tags".into(),
                    field_name: "Tags".into(),
                    field_type: FieldType::String,
                    is_multi: true,
                    ..Header::default()
                },
            ],
            record_title_format_string: template.into(),
            ..Workflow::default()
        };
        let record = Record {
            values: vec![
                Value::new("name", RawValue::Text("widget".into())),
                Value::new("qty", RawValue::Number(5.0)),
                Value::new(
                    "tags",
                    RawValue::List(vec![RawValue::Text("a".into())]),
                ),
            ],
            ..Record::default()
        };
        (record, workflow)
    }

    fn title(template: &str) -> String {
        let (record, workflow) = fixture(template);
        record_title(&record, &workflow, TzOffset::default(), &[])
    }

    #[test]
    fn substitutes_display_values() {
        assert_eq!(title("{{name}} x{{qty}}"), "widget x5");
    }

    #[test]
    fn unknown_key_substitutes_empty() {
        assert_eq!(title("[{{ghost}}] {{name}}"), "[] widget");
    }

    #[test]
    fn multi_field_substitutes_empty() {
        assert_eq!(title("{{tags}}{{name}}"), "widget");
    }

    #[test]
    fn literal_text_passes_through() {
        assert_eq!(title("no placeholders"), "no placeholders");
        assert_eq!(title(""), "");
    }

    #[test]
    fn unterminated_placeholder_kept_verbatim() {
        assert_eq!(title("{{name}} {{oops"), "widget {{oops");
    }
}
