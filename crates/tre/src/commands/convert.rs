//! `tre convert` -- print a record's full display payload.

use anyhow::Result;

use trellis_convert::{ConvertOptions, convert_record};

use crate::cli::InputArgs;
use crate::commands::load_inputs;
use crate::context::RuntimeContext;

/// Execute the `tre convert` command.
pub fn run(ctx: &RuntimeContext, args: &InputArgs) -> Result<()> {
    let (workflow, record) = load_inputs(args)?;
    let opts = ConvertOptions {
        timezone: ctx.timezone,
        role_id: ctx.role_id(),
    };
    let converted = convert_record(&record, &workflow, &ctx.users, &opts)?;
    println!("{}", serde_json::to_string_pretty(&converted)?);
    Ok(())
}
