//! Result type inference.
//!
//! Statically determines, from a formula's structure and the referenced
//! field types, whether its result is numeric or one of the temporal
//! subtypes -- without evaluating it. The condition evaluator uses this to
//! pick the correct comparison semantics, and display formatting uses it to
//! pick the canonical date format.

use trellis_core::{BinaryOp, DateType, Factor, FieldType, FormulaExpr, FormulaGroup, Header};

use crate::eval::MAX_EVAL_DEPTH;
use crate::resolve::{header_by_id, header_by_name};

/// The statically inferred result type of a formula expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Number,
    DateTime(DateType),
}

/// Infers the result type of a formula from its first group.
///
/// Branch variants of one formula share a result type by construction, so
/// the first group stands in for all of them.
pub fn infer_formula(formula: &[FormulaGroup], headers: &[Header]) -> Option<ResultType> {
    infer_formula_at(formula, headers, 0)
}

/// Infers the result type of one formula expression.
pub fn infer_expr(expr: &FormulaExpr, headers: &[Header]) -> Option<ResultType> {
    infer_expr_at(expr, headers, 0)
}

fn infer_formula_at(
    formula: &[FormulaGroup],
    headers: &[Header],
    depth: usize,
) -> Option<ResultType> {
    if depth >= MAX_EVAL_DEPTH {
        tracing::warn!(depth, "formula nesting limit reached during type inference");
        return None;
    }
    infer_expr_at(&formula.first()?.items, headers, depth)
}

fn infer_expr_at(expr: &FormulaExpr, headers: &[Header], depth: usize) -> Option<ResultType> {
    match expr {
        FormulaExpr::Group(inner) => infer_expr_at(&inner.items, headers, depth),
        FormulaExpr::Aggregate { .. } => Some(ResultType::Number),
        FormulaExpr::Binary {
            factor_a,
            op,
            factor_b,
        } => {
            let a = factor_type(factor_a, headers, depth)?;
            let b = factor_type(factor_b, headers, depth)?;
            match (a, *op, b) {
                (ResultType::Number, _, ResultType::Number) => Some(ResultType::Number),
                (ResultType::DateTime(dt), BinaryOp::Plus | BinaryOp::Minus, ResultType::Number) => {
                    Some(ResultType::DateTime(dt))
                }
                (ResultType::Number, BinaryOp::Plus, ResultType::DateTime(dt)) => {
                    Some(ResultType::DateTime(dt))
                }
                (ResultType::DateTime(_), BinaryOp::Minus, ResultType::DateTime(_)) => {
                    Some(ResultType::Number)
                }
                _ => None,
            }
        }
    }
}

fn factor_type(factor: &Factor, headers: &[Header], depth: usize) -> Option<ResultType> {
    let (field_id, field_name) = match factor {
        Factor::Constant { .. } => return Some(ResultType::Number),
        Factor::Field {
            field_id,
            field_name,
            ..
        } => (field_id.as_deref(), field_name.as_deref()),
    };
    let header = field_id
        .and_then(|id| header_by_id(id, headers))
        .or_else(|| field_name.and_then(|name| header_by_name(name, headers)))?;
    match &header.field_type {
        FieldType::Number => Some(ResultType::Number),
        FieldType::DateTime => Some(ResultType::DateTime(header.date_type())),
        FieldType::Formula => {
            let formula = header.config.formula.as_deref()?;
            infer_formula_at(formula, headers, depth + 1)
        }
        _ => None,
    }
}
