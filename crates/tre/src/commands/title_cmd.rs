//! `tre title` -- render a record's templated title.

use anyhow::Result;

use trellis_convert::record_title;

use crate::cli::InputArgs;
use crate::commands::load_inputs;
use crate::context::RuntimeContext;

/// Execute the `tre title` command.
pub fn run(ctx: &RuntimeContext, args: &InputArgs) -> Result<()> {
    let (workflow, record) = load_inputs(args)?;
    println!(
        "{}",
        record_title(&record, &workflow, ctx.timezone, &ctx.users)
    );
    Ok(())
}
