//! Formula evaluation.
//!
//! [`Evaluator`] walks a formula's operand/operator structure, resolves
//! operand values (recursing into nested formula fields), performs
//! type-aware arithmetic between numbers and timestamps, and applies
//! row-scoped aggregates over table columns.
//!
//! "Cannot compute" is `None`, never an error: schemas evolve independently
//! of stored records, so missing references degrade to a blank result.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Months, Utc};
use tracing::{debug, warn};

use trellis_core::{
    AggregateOp, BinaryOp, Factor, FieldType, FormulaExpr, FormulaGroup, Header, RawValue,
    TimeUnit, Value,
};

use crate::infer::{ResultType, infer_expr};
use crate::resolve::{RowScope, header_by_id, header_by_name, raw_value};

/// Ceiling on formula-to-formula nesting. Cyclic references (a latent
/// schema-authoring mistake) fail closed to `None` instead of overflowing
/// the stack.
pub const MAX_EVAL_DEPTH: usize = 32;

const MS_PER_DAY: f64 = 86_400_000.0;

/// A raw evaluation result: numeric or temporal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Computed {
    Number(f64),
    DateTime(DateTime<Utc>),
}

impl Computed {
    pub fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            Self::DateTime(_) => None,
        }
    }

    pub fn as_datetime(self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(d) => Some(d),
            Self::Number(_) => None,
        }
    }
}

/// The outcome of a full formula evaluation: the raw value plus the
/// statically inferred result type of the branch that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalOutcome {
    pub raw: Computed,
    pub kind: Option<ResultType>,
}

/// One evaluation pass over a record.
///
/// Holds the schema/value snapshot, the caller's role (for project-role
/// conditions), and the per-pass memo of computed sub-formula results. The
/// memo replaces the transient caching the storage layer used to scribble
/// onto value objects; inputs are never mutated.
pub struct Evaluator<'a> {
    headers: &'a [Header],
    values: &'a [Value],
    pub(crate) role_id: Option<&'a str>,
    depth: usize,
    memo: HashMap<(String, RowScope), Option<Computed>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(headers: &'a [Header], values: &'a [Value]) -> Self {
        Self {
            headers,
            values,
            role_id: None,
            depth: 0,
            memo: HashMap::new(),
        }
    }

    /// Sets the caller's role id, matched by project-role conditions.
    pub fn with_role(mut self, role_id: Option<&'a str>) -> Self {
        self.role_id = role_id;
        self
    }

    pub fn headers(&self) -> &'a [Header] {
        self.headers
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Evaluates a formula: selects the first group whose condition holds
    /// (falling back to the `elseTo` group by exhaustion), evaluates it, and
    /// pairs the raw result with its inferred type.
    pub fn evaluate(
        &mut self,
        formula: &[FormulaGroup],
        scope: &RowScope,
    ) -> Option<EvalOutcome> {
        let group = self.select_group(formula, scope)?;
        let raw = self.eval_expr(&group.items, scope)?;
        let kind = infer_expr(&group.items, self.headers);
        Some(EvalOutcome { raw, kind })
    }

    /// Evaluates a formula to its display string; blank when no branch
    /// applies or the selected branch cannot compute.
    pub fn evaluate_display(&mut self, formula: &[FormulaGroup], scope: &RowScope) -> String {
        match self.evaluate(formula, scope) {
            Some(outcome) => format_outcome(&outcome),
            None => String::new(),
        }
    }

    /// First-match-wins branch selection; the `elseTo` branch only by
    /// exhaustion.
    fn select_group<'f>(
        &mut self,
        formula: &'f [FormulaGroup],
        scope: &RowScope,
    ) -> Option<&'f FormulaGroup> {
        for (index, group) in formula.iter().enumerate() {
            if self.condition_matches(group.condition.as_ref(), scope) {
                debug!(branch = index, "formula branch selected");
                return Some(group);
            }
        }
        let fallback = formula
            .iter()
            .find(|g| g.condition.as_ref().is_some_and(|c| c.else_to));
        if fallback.is_some() {
            debug!("formula fell back to else branch");
        }
        fallback
    }

    /// Evaluates one formula expression under a row scope.
    pub fn eval_expr(&mut self, expr: &FormulaExpr, scope: &RowScope) -> Option<Computed> {
        match expr {
            // Formula aliasing: recurse into the nested group, ignoring its
            // condition.
            FormulaExpr::Group(inner) => self.eval_expr(&inner.items, scope),
            FormulaExpr::Aggregate { factor, op } => self.eval_aggregate(factor, *op),
            FormulaExpr::Binary {
                factor_a,
                op,
                factor_b,
            } => self.eval_binary(factor_a, *op, factor_b, scope),
        }
    }

    fn eval_binary(
        &mut self,
        factor_a: &Factor,
        op: BinaryOp,
        factor_b: &Factor,
        scope: &RowScope,
    ) -> Option<Computed> {
        let a = self.resolve_factor(factor_a, scope)?;
        let b = self.resolve_factor(factor_b, scope)?;
        match (a, b) {
            (Computed::Number(x), Computed::Number(y)) => {
                let n = match op {
                    BinaryOp::Plus => x + y,
                    BinaryOp::Minus => x - y,
                    BinaryOp::Multiply => x * y,
                    // Division by zero is representable, not fatal.
                    BinaryOp::Divide => {
                        if y == 0.0 {
                            f64::NAN
                        } else {
                            x / y
                        }
                    }
                };
                Some(Computed::Number(n))
            }
            (Computed::DateTime(d), Computed::Number(n)) => {
                let unit = factor_b.unit().unwrap_or(TimeUnit::Days);
                let qty = match op {
                    BinaryOp::Plus => n,
                    BinaryOp::Minus => -n,
                    _ => return None,
                };
                shift_datetime(d, qty, unit).map(Computed::DateTime)
            }
            // Commutative date shift: quantity plus date.
            (Computed::Number(n), Computed::DateTime(d)) if op == BinaryOp::Plus => {
                let unit = factor_a.unit().unwrap_or(TimeUnit::Days);
                shift_datetime(d, n, unit).map(Computed::DateTime)
            }
            (Computed::DateTime(x), Computed::DateTime(y)) if op == BinaryOp::Minus => {
                // Signed real-valued day count; +1 covers inclusive ranges.
                let mut days = (x - y).num_milliseconds() as f64 / MS_PER_DAY;
                if factor_b.include_end_date() {
                    days += 1.0;
                }
                Some(Computed::Number(days))
            }
            _ => None,
        }
    }

    /// Aggregates one table column across every row of every table value.
    ///
    /// `average` over zero rows is 0, not NaN -- observable behavior the
    /// numeric divide's NaN-on-zero policy deliberately does not share.
    fn eval_aggregate(&mut self, factor: &Factor, op: AggregateOp) -> Option<Computed> {
        let column = match self.factor_field_id(factor) {
            Some(field_id) => self.column_numbers(&field_id),
            None => Vec::new(),
        };
        let n = match op {
            AggregateOp::Sum => column.iter().sum(),
            AggregateOp::Count => column.len() as f64,
            AggregateOp::Average => {
                if column.is_empty() {
                    0.0
                } else {
                    column.iter().sum::<f64>() / column.len() as f64
                }
            }
        };
        Some(Computed::Number(n))
    }

    /// Collects the numeric value of a sub-field across all table rows,
    /// resolving nested formula sub-fields and defaulting anything
    /// unresolved to 0 so counts stay aligned with row occupancy.
    fn column_numbers(&mut self, field_id: &str) -> Vec<f64> {
        let headers = self.headers;
        let values = self.values;
        let mut column = Vec::new();
        for value in values {
            let Some(header) = header_by_id(&value.field_id, headers) else {
                continue;
            };
            if !header.field_type.is_table() {
                continue;
            }
            let Some(rows) = value.value.as_rows() else {
                continue;
            };
            let is_formula_column = header
                .sub_header(field_id)
                .is_some_and(|sh| sh.field_type == FieldType::Formula);
            for (index, row) in rows.iter().enumerate() {
                for sub in row.values.iter().filter(|v| v.field_id == field_id) {
                    let n = if is_formula_column {
                        let scope = RowScope::row(value.field_id.clone(), index);
                        self.resolve_field(field_id, &scope)
                            .and_then(Computed::as_number)
                    } else {
                        coerce_number(&sub.value)
                    };
                    column.push(n.unwrap_or(0.0));
                }
            }
        }
        column
    }

    fn factor_field_id(&self, factor: &Factor) -> Option<String> {
        match factor {
            Factor::Constant { .. } => None,
            Factor::Field {
                field_id: Some(id), ..
            } => Some(id.clone()),
            Factor::Field {
                field_id: None,
                field_name,
                ..
            } => field_name
                .as_deref()
                .and_then(|name| header_by_name(name, self.headers))
                .map(|h| h.id.clone()),
        }
    }

    fn resolve_factor(&mut self, factor: &Factor, scope: &RowScope) -> Option<Computed> {
        match factor {
            Factor::Constant { value, .. } => Some(Computed::Number(*value)),
            Factor::Field { .. } => {
                let field_id = self.factor_field_id(factor)?;
                self.resolve_field(&field_id, scope)
            }
        }
    }

    /// The Value Resolver: returns the evaluable value of a field under a
    /// row scope, recursing into the formula evaluator when the field is
    /// itself a formula field.
    pub fn resolve_field(&mut self, field_id: &str, scope: &RowScope) -> Option<Computed> {
        let header = header_by_id(field_id, self.headers)?;
        match &header.field_type {
            FieldType::Number => {
                coerce_number(raw_value(field_id, scope, self.headers, self.values)?)
                    .map(Computed::Number)
            }
            FieldType::DateTime => raw_value(field_id, scope, self.headers, self.values)?
                .as_datetime()
                .map(Computed::DateTime),
            FieldType::Formula => self.resolve_formula_field(header, scope),
            _ => None,
        }
    }

    /// Computes a formula field's value, memoised per (field, scope) for the
    /// duration of this pass, with a depth guard against cyclic references.
    fn resolve_formula_field(&mut self, header: &Header, scope: &RowScope) -> Option<Computed> {
        let key = (header.id.clone(), scope.clone());
        if let Some(cached) = self.memo.get(&key) {
            return *cached;
        }
        if self.depth >= MAX_EVAL_DEPTH {
            warn!(
                field_id = %header.id,
                depth = self.depth,
                "formula nesting limit reached; result degraded to blank"
            );
            return None;
        }
        let formula = header.config.formula.as_ref()?;
        self.depth += 1;
        let result = self.evaluate(formula, scope).map(|o| o.raw);
        self.depth -= 1;
        self.memo.insert(key, result);
        result
    }
}

/// Numeric coercion for stored values: numbers pass through, numeric text
/// parses.
pub(crate) fn coerce_number(raw: &RawValue) -> Option<f64> {
    match raw {
        RawValue::Number(n) => Some(*n),
        RawValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Shifts a timestamp by a signed quantity of a unit. Fractional quantities
/// drop to hour precision, which the unit alone cannot represent.
fn shift_datetime(d: DateTime<Utc>, qty: f64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    if !qty.is_finite() {
        return None;
    }
    if qty.fract() != 0.0 {
        let ms = (qty * unit.hours_factor() * 3_600_000.0).round() as i64;
        return d.checked_add_signed(Duration::milliseconds(ms));
    }
    if unit.is_calendar() {
        let months = match unit {
            TimeUnit::Years => (qty as i64).checked_mul(12)?,
            _ => qty as i64,
        };
        let magnitude = u32::try_from(months.unsigned_abs()).ok()?;
        return if months >= 0 {
            d.checked_add_months(Months::new(magnitude))
        } else {
            d.checked_sub_months(Months::new(magnitude))
        };
    }
    let seconds = match unit {
        TimeUnit::Weeks => (qty as i64).checked_mul(604_800)?,
        TimeUnit::Days => (qty as i64).checked_mul(86_400)?,
        TimeUnit::Hours => (qty as i64).checked_mul(3_600)?,
        TimeUnit::Minutes => (qty as i64).checked_mul(60)?,
        _ => qty as i64,
    };
    d.checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Formats a raw result for display: temporal results use the inferred
/// subtype's canonical form, numeric results stringify.
pub fn format_outcome(outcome: &EvalOutcome) -> String {
    match (outcome.kind, outcome.raw) {
        (Some(ResultType::DateTime(dt)), Computed::DateTime(d)) => {
            d.format(dt.format_str()).to_string()
        }
        (_, Computed::Number(n)) => format_number(n),
        // Temporal raw without a usable inferred type: full precision.
        (_, Computed::DateTime(d)) => d.format("%Y-%m-%d %H:%M").to_string(),
    }
}

/// Stringifies a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
