//! `tre eval` -- evaluate one formula field.

use anyhow::{Context, Result, bail};

use trellis_core::FieldType;
use trellis_formula::{Evaluator, RowScope, header_by_id};

use crate::cli::EvalArgs;
use crate::commands::load_inputs;
use crate::context::RuntimeContext;

/// Execute the `tre eval` command.
pub fn run(ctx: &RuntimeContext, args: &EvalArgs) -> Result<()> {
    let (workflow, record) = load_inputs(&args.input)?;
    let header = header_by_id(&args.field, &workflow.headers)
        .with_context(|| format!("no field with id {:?} in schema", args.field))?;
    if header.field_type != FieldType::Formula {
        bail!(
            "field {:?} is a {} field, not a formula",
            args.field,
            header.field_type.as_str()
        );
    }
    let formula = header
        .config
        .formula
        .as_ref()
        .with_context(|| format!("field {:?} has no formula configured", args.field))?;
    let mut evaluator =
        Evaluator::new(&workflow.headers, &record.values).with_role(ctx.role_id());
    println!("{}", evaluator.evaluate_display(formula, &RowScope::Top));
    Ok(())
}
