//! Command handlers for the `tre` CLI.

pub mod convert;
pub mod eval;
pub mod title_cmd;

use anyhow::{Context, Result};
use tracing::debug;

use trellis_core::{Record, Workflow};

use crate::cli::InputArgs;

/// Loads the workflow schema and record JSON inputs.
pub(crate) fn load_inputs(args: &InputArgs) -> Result<(Workflow, Record)> {
    let schema = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("failed to read schema file: {}", args.schema))?;
    let workflow: Workflow = serde_json::from_str(&schema)
        .with_context(|| format!("failed to parse schema file: {}", args.schema))?;
    let record = std::fs::read_to_string(&args.record)
        .with_context(|| format!("failed to read record file: {}", args.record))?;
    let record: Record = serde_json::from_str(&record)
        .with_context(|| format!("failed to parse record file: {}", args.record))?;
    debug!(
        headers = workflow.headers.len(),
        values = record.values.len(),
        "loaded inputs"
    );
    Ok((workflow, record))
}
