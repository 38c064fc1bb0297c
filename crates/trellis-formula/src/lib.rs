//! Conditional formula evaluation for trellis records.
//!
//! A formula field holds an ordered list of variants, each optionally guarded
//! by a condition. Evaluation picks the first matching variant, computes its
//! expression over the record's values (including aggregates over table rows
//! and references to other formula fields), and reports the result together
//! with its inferred type so callers can format it.

pub mod condition;
pub mod eval;
pub mod infer;
pub mod resolve;

pub use eval::{Computed, EvalOutcome, Evaluator, MAX_EVAL_DEPTH, format_number, format_outcome};
pub use infer::{ResultType, infer_expr, infer_formula};
pub use resolve::{RowScope, header_by_id, header_by_name, parent_table_of, raw_value};
