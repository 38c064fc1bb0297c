//! Condition evaluation: decides which formula variant applies.
//!
//! Conditions never fail evaluation. A clause with a missing field,
//! operator, or comparison value degrades to non-match, so a formula whose
//! schema drifted simply stops matching instead of erroring.

use chrono::{DateTime, Datelike, Timelike, Utc};

use trellis_core::{
    AndClause, CompareOp, Condition, DateType, FieldEmptyRef, FieldType, FieldValueRef, Header,
    RawValue,
};

use crate::eval::Evaluator;
use crate::infer::{ResultType, infer_formula};
use crate::resolve::{RowScope, header_by_id, raw_value};

impl Evaluator<'_> {
    /// Evaluates a branch condition under a row scope.
    ///
    /// `None` means unconditional (true). An `elseTo` condition never
    /// matches positively; it is selected only by exhaustion. Otherwise the
    /// condition holds iff at least one AND-group has all clauses true.
    pub fn condition_matches(&mut self, condition: Option<&Condition>, scope: &RowScope) -> bool {
        let Some(condition) = condition else {
            return true;
        };
        if condition.else_to {
            return false;
        }
        condition
            .conditions
            .iter()
            .any(|group| group.iter().all(|clause| self.clause_matches(clause, scope)))
    }

    fn clause_matches(&mut self, clause: &AndClause, scope: &RowScope) -> bool {
        match clause {
            AndClause::FieldValue(r) => self.field_value_matches(r, scope),
            AndClause::FieldEmpty(r) => self.field_empty_matches(r, scope),
            AndClause::ProjectRole(r) => self.role_id == Some(r.project_role_id.as_str()),
        }
    }

    fn field_value_matches(&mut self, r: &FieldValueRef, scope: &RowScope) -> bool {
        let Some(header) = header_by_id(&r.field_id, self.headers()) else {
            return false;
        };
        let Some(op) = r.operator else {
            return false;
        };
        let Some(expected) = r.value.as_ref() else {
            return false;
        };
        self.typed_compare(header, op, expected, scope)
            .unwrap_or(false)
    }

    /// Dispatches to the comparator for the field's type.
    fn typed_compare(
        &mut self,
        header: &Header,
        op: CompareOp,
        expected: &RawValue,
        scope: &RowScope,
    ) -> Option<bool> {
        match &header.field_type {
            FieldType::Number => self.numeric_clause(&header.id, op, expected, scope),
            FieldType::DateTime => {
                self.temporal_clause(&header.id, op, expected, scope, header.date_type())
            }
            FieldType::Formula => {
                // Pick comparison semantics from the formula's inferred type.
                let formula = header.config.formula.as_ref()?;
                match infer_formula(formula, self.headers())? {
                    ResultType::Number => self.numeric_clause(&header.id, op, expected, scope),
                    ResultType::DateTime(dt) => {
                        self.temporal_clause(&header.id, op, expected, scope, dt)
                    }
                }
            }
            FieldType::Set => {
                if !op.is_equality() {
                    return None;
                }
                let raw = raw_value(&header.id, scope, self.headers(), self.values())?;
                let actual = set_display(header, raw)?;
                Some(op.compare(&actual.as_str(), &expected.as_text()?))
            }
            FieldType::Boolean => {
                if op != CompareOp::Eq {
                    return None;
                }
                let RawValue::Bool(actual) =
                    raw_value(&header.id, scope, self.headers(), self.values())?
                else {
                    return None;
                };
                let RawValue::Bool(expected) = expected else {
                    return None;
                };
                Some(actual == expected)
            }
            FieldType::AutoId => {
                if !op.is_equality() {
                    return None;
                }
                let RawValue::AutoId(actual) =
                    raw_value(&header.id, scope, self.headers(), self.values())?
                else {
                    return None;
                };
                Some(op.compare(&actual.prefix.as_str(), &expected.as_text()?))
            }
            FieldType::Table | FieldType::Section => None,
            _ => {
                if !op.is_equality() {
                    return None;
                }
                let raw = raw_value(&header.id, scope, self.headers(), self.values())?;
                Some(op.compare(&raw.as_text()?, &expected.as_text()?))
            }
        }
    }

    fn numeric_clause(
        &mut self,
        field_id: &str,
        op: CompareOp,
        expected: &RawValue,
        scope: &RowScope,
    ) -> Option<bool> {
        let actual = self.resolve_field(field_id, scope)?.as_number()?;
        let expected = expect_number(expected)?;
        Some(op.compare(&actual, &expected))
    }

    fn temporal_clause(
        &mut self,
        field_id: &str,
        op: CompareOp,
        expected: &RawValue,
        scope: &RowScope,
        date_type: DateType,
    ) -> Option<bool> {
        let actual = self.resolve_field(field_id, scope)?.as_datetime()?;
        let expected = expect_datetime(expected)?;
        Some(op.compare(&date_key(actual, date_type), &date_key(expected, date_type)))
    }

    fn field_empty_matches(&mut self, r: &FieldEmptyRef, scope: &RowScope) -> bool {
        let Some(header) = header_by_id(&r.field_id, self.headers()) else {
            return false;
        };
        self.effective_blank(header, scope) == r.is_empty
    }

    /// Whether the field's effective "comparable" value is blank.
    fn effective_blank(&mut self, header: &Header, scope: &RowScope) -> bool {
        if header.field_type == FieldType::Formula {
            return self.resolve_field(&header.id, scope).is_none();
        }
        let Some(raw) = raw_value(&header.id, scope, self.headers(), self.values()) else {
            return true;
        };
        match &header.field_type {
            FieldType::AutoId => match raw {
                RawValue::AutoId(a) => a.prefix.is_empty() && a.value.is_none(),
                _ => true,
            },
            FieldType::Image | FieldType::File => match raw {
                RawValue::File(f) => f.file_name.is_empty(),
                _ => true,
            },
            FieldType::Set => set_display(header, raw).is_none_or(|s| s.is_empty()),
            _ => raw.is_blank(),
        }
    }
}

/// The comparable display value of a Set field: the matching option's label,
/// or the raw value itself when free-text entries are allowed.
fn set_display(header: &Header, raw: &RawValue) -> Option<String> {
    let text = raw.as_text()?;
    match header.config.option_label(text) {
        Some(label) => Some(label.to_owned()),
        None if header.config.allow_other => Some(text.to_owned()),
        None => None,
    }
}

fn expect_number(raw: &RawValue) -> Option<f64> {
    match raw {
        RawValue::Number(n) => Some(*n),
        RawValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn expect_datetime(raw: &RawValue) -> Option<DateTime<Utc>> {
    match raw {
        RawValue::DateTime(d) => Some(*d),
        RawValue::Text(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        _ => None,
    }
}

/// Collapses a timestamp to the comparison granularity of a date type:
/// whole days for date-only, minute-of-day for time-only, minutes since
/// epoch otherwise.
fn date_key(d: DateTime<Utc>, date_type: DateType) -> i64 {
    match date_type {
        DateType::DateOnly => i64::from(d.date_naive().num_days_from_ce()),
        DateType::TimeOnly => i64::from(d.hour() * 60 + d.minute()),
        DateType::DateTimeLocal | DateType::DateTimeUtc => d.timestamp() / 60,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_core::{
        AutoIdValue, BinaryOp, Factor, FormulaExpr, FormulaGroup, HeaderConfig, ProjectRoleRef,
        SetOption, Value,
    };

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn headers() -> Vec<Header> {
        vec![
            Header {
                id: "num".into(),
                field_type: FieldType::Number,
                ..Header::default()
            },
            Header {
                id: "date".into(),
                field_type: FieldType::DateTime,
                config: HeaderConfig {
                    date_type: Some(DateType::DateOnly),
                    ..HeaderConfig::default()
                },
                ..Header::default()
            },
            Header {
                id: "set".into(),
                field_type: FieldType::Set,
                config: HeaderConfig {
                    options: vec![SetOption {
                        id: "o1".into(),
                        value: "test1".into(),
                    }],
                    ..HeaderConfig::default()
                },
                ..Header::default()
            },
            Header {
                id: "flag".into(),
                field_type: FieldType::Boolean,
                ..Header::default()
            },
            Header {
                id: "aid".into(),
                field_type: FieldType::AutoId,
                ..Header::default()
            },
            Header {
                id: "text".into(),
                field_type: FieldType::String,
                ..Header::default()
            },
            Header {
                id: "calc".into(),
                field_type: FieldType::Formula,
                config: HeaderConfig {
                    formula: Some(vec![FormulaGroup::unconditional(FormulaExpr::Binary {
                        factor_a: Factor::field("num"),
                        op: BinaryOp::Multiply,
                        factor_b: Factor::constant(2.0),
                    })]),
                    ..HeaderConfig::default()
                },
                ..Header::default()
            },
        ]
    }

    fn values() -> Vec<Value> {
        vec![
            Value::new("num", RawValue::Number(10.0)),
            Value::new("date", RawValue::DateTime(utc("2022-01-19T08:30:00Z"))),
            Value::new("set", RawValue::Text("o1".into())),
            Value::new("flag", RawValue::Bool(true)),
            Value::new(
                "aid",
                RawValue::AutoId(AutoIdValue {
                    prefix: "a-".into(),
                    value: Some(1),
                }),
            ),
            Value::new("text", RawValue::Text("hello".into())),
        ]
    }

    fn field_value(field_id: &str, op: CompareOp, value: RawValue) -> Condition {
        Condition {
            else_to: false,
            conditions: vec![vec![AndClause::FieldValue(FieldValueRef {
                field_id: field_id.into(),
                operator: Some(op),
                value: Some(value),
            })]],
        }
    }

    fn matches(condition: &Condition, headers: &[Header], values: &[Value]) -> bool {
        Evaluator::new(headers, values).condition_matches(Some(condition), &RowScope::Top)
    }

    #[test]
    fn null_condition_is_true() {
        let headers = headers();
        let mut evaluator = Evaluator::new(&headers, &[]);
        assert!(evaluator.condition_matches(None, &RowScope::Top));
    }

    #[test]
    fn empty_condition_list_never_matches() {
        // Only an absent condition is unconditional; a present-but-empty
        // OR list has no group to satisfy.
        let headers = headers();
        let cond = Condition {
            else_to: false,
            conditions: vec![],
        };
        assert!(!matches(&cond, &headers, &[]));
    }

    #[test]
    fn else_branch_never_matches_positively() {
        let headers = headers();
        let mut evaluator = Evaluator::new(&headers, &[]);
        assert!(!evaluator.condition_matches(Some(&Condition::else_branch()), &RowScope::Top));
    }

    #[test]
    fn numeric_comparisons() {
        let (headers, values) = (headers(), values());
        assert!(matches(
            &field_value("num", CompareOp::Ge, RawValue::Number(10.0)),
            &headers,
            &values
        ));
        assert!(matches(
            &field_value("num", CompareOp::Lt, RawValue::Number(11.0)),
            &headers,
            &values
        ));
        assert!(!matches(
            &field_value("num", CompareOp::Gt, RawValue::Number(10.0)),
            &headers,
            &values
        ));
    }

    #[test]
    fn datetime_comparison_honors_date_only_granularity() {
        let (headers, values) = (headers(), values());
        // Same calendar day, different time of day: equal under dateOnly.
        assert!(matches(
            &field_value(
                "date",
                CompareOp::Eq,
                RawValue::DateTime(utc("2022-01-19T23:59:00Z"))
            ),
            &headers,
            &values
        ));
        assert!(matches(
            &field_value(
                "date",
                CompareOp::Lt,
                RawValue::DateTime(utc("2022-01-20T00:00:00Z"))
            ),
            &headers,
            &values
        ));
    }

    #[test]
    fn set_compares_against_option_label() {
        let (headers, values) = (headers(), values());
        assert!(matches(
            &field_value("set", CompareOp::Eq, RawValue::Text("test1".into())),
            &headers,
            &values
        ));
        assert!(matches(
            &field_value("set", CompareOp::Ne, RawValue::Text("test2".into())),
            &headers,
            &values
        ));
        // Ordering operators degrade to non-match on sets.
        assert!(!matches(
            &field_value("set", CompareOp::Lt, RawValue::Text("zzz".into())),
            &headers,
            &values
        ));
    }

    #[test]
    fn boolean_equality_only() {
        let (headers, values) = (headers(), values());
        assert!(matches(
            &field_value("flag", CompareOp::Eq, RawValue::Bool(true)),
            &headers,
            &values
        ));
        assert!(!matches(
            &field_value("flag", CompareOp::Ne, RawValue::Bool(false)),
            &headers,
            &values
        ));
    }

    #[test]
    fn auto_id_compares_prefix_only() {
        let (headers, values) = (headers(), values());
        assert!(matches(
            &field_value("aid", CompareOp::Eq, RawValue::Text("a-".into())),
            &headers,
            &values
        ));
        assert!(!matches(
            &field_value("aid", CompareOp::Eq, RawValue::Text("b-".into())),
            &headers,
            &values
        ));
    }

    #[test]
    fn formula_field_compares_by_inferred_type() {
        let (headers, values) = (headers(), values());
        // calc = num * 2 = 20.
        assert!(matches(
            &field_value("calc", CompareOp::Eq, RawValue::Number(20.0)),
            &headers,
            &values
        ));
        assert!(!matches(
            &field_value("calc", CompareOp::Gt, RawValue::Number(20.0)),
            &headers,
            &values
        ));
    }

    #[test]
    fn string_equality_fallback() {
        let (headers, values) = (headers(), values());
        assert!(matches(
            &field_value("text", CompareOp::Eq, RawValue::Text("hello".into())),
            &headers,
            &values
        ));
    }

    #[test]
    fn missing_pieces_degrade_to_non_match() {
        let (headers, values) = (headers(), values());
        // Unknown field.
        assert!(!matches(
            &field_value("ghost", CompareOp::Eq, RawValue::Number(1.0)),
            &headers,
            &values
        ));
        // Missing operator.
        let cond = Condition {
            else_to: false,
            conditions: vec![vec![AndClause::FieldValue(FieldValueRef {
                field_id: "num".into(),
                operator: None,
                value: Some(RawValue::Number(10.0)),
            })]],
        };
        assert!(!matches(&cond, &headers, &values));
        // Missing comparison value.
        let cond = Condition {
            else_to: false,
            conditions: vec![vec![AndClause::FieldValue(FieldValueRef {
                field_id: "num".into(),
                operator: Some(CompareOp::Eq),
                value: None,
            })]],
        };
        assert!(!matches(&cond, &headers, &values));
    }

    #[test]
    fn field_empty_checks() {
        let (headers, values) = (headers(), values());
        let empty = |field_id: &str, is_empty: bool| Condition {
            else_to: false,
            conditions: vec![vec![AndClause::FieldEmpty(FieldEmptyRef {
                field_id: field_id.into(),
                is_empty,
            })]],
        };
        assert!(matches(&empty("num", false), &headers, &values));
        assert!(!matches(&empty("num", true), &headers, &values));
        // Unknown header is a non-match, not "blank".
        assert!(!matches(&empty("ghost", true), &headers, &[]));
        let blank_values = vec![Value::new("text", RawValue::Text(String::new()))];
        assert!(matches(&empty("text", true), &headers, &blank_values));
    }

    #[test]
    fn project_role_comparison() {
        let headers = headers();
        let cond = Condition {
            else_to: false,
            conditions: vec![vec![AndClause::ProjectRole(ProjectRoleRef {
                project_role_id: "admin".into(),
            })]],
        };
        let mut with_role = Evaluator::new(&headers, &[]).with_role(Some("admin"));
        assert!(with_role.condition_matches(Some(&cond), &RowScope::Top));
        let mut wrong_role = Evaluator::new(&headers, &[]).with_role(Some("viewer"));
        assert!(!wrong_role.condition_matches(Some(&cond), &RowScope::Top));
        let mut no_role = Evaluator::new(&headers, &[]);
        assert!(!no_role.condition_matches(Some(&cond), &RowScope::Top));
    }

    #[test]
    fn or_of_ands() {
        let (headers, values) = (headers(), values());
        let clause = |field_id: &str, op: CompareOp, value: RawValue| {
            AndClause::FieldValue(FieldValueRef {
                field_id: field_id.into(),
                operator: Some(op),
                value: Some(value),
            })
        };
        // (num > 100 AND flag = true) OR (text = "hello" AND num = 10) -- second group holds.
        let cond = Condition {
            else_to: false,
            conditions: vec![
                vec![
                    clause("num", CompareOp::Gt, RawValue::Number(100.0)),
                    clause("flag", CompareOp::Eq, RawValue::Bool(true)),
                ],
                vec![
                    clause("text", CompareOp::Eq, RawValue::Text("hello".into())),
                    clause("num", CompareOp::Eq, RawValue::Number(10.0)),
                ],
            ],
        };
        assert!(matches(&cond, &headers, &values));
        // AND fails when one clause fails.
        let cond = Condition {
            else_to: false,
            conditions: vec![vec![
                clause("text", CompareOp::Eq, RawValue::Text("hello".into())),
                clause("num", CompareOp::Eq, RawValue::Number(11.0)),
            ]],
        };
        assert!(!matches(&cond, &headers, &values));
    }
}
