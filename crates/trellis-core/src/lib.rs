//! Core types for the trellis record system.
//!
//! This crate contains the domain model: field schemas (headers), stored
//! record values, formula and condition definitions, and the workflow/record
//! envelopes that tie them together.

pub mod condition;
pub mod field_type;
pub mod formula;
pub mod header;
pub mod record;
pub mod value;
pub mod workflow;

pub use condition::{AndClause, Condition, FieldEmptyRef, FieldValueRef, ProjectRoleRef};
pub use field_type::{AggregateOp, BinaryOp, CompareOp, DateType, FieldType, TimeUnit};
pub use formula::{Factor, Formula, FormulaExpr, FormulaGroup};
pub use header::{AutoIdPrefix, Header, HeaderConfig, SetOption};
pub use record::Record;
pub use value::{AutoIdValue, FileValue, RawValue, TableRow, Value};
pub use workflow::{ProjectUser, StatusEntry, Workflow, user_name};
