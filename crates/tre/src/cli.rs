//! Clap CLI definitions for the `tre` command.

use clap::{Args, Parser, Subcommand};

/// tre -- Record display converter.
///
/// Loads a workflow schema and a record from JSON files and prints display
/// payloads: the full converted record, a single field's display value, or
/// the templated record title.
#[derive(Parser, Debug)]
#[command(
    name = "tre",
    about = "Record display converter for the trellis system",
    version,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Timezone offset for local date display, e.g. "+0800".
    #[arg(long, global = true, env = "TRE_TIMEZONE")]
    pub timezone: Option<String>,

    /// Project role id of the acting user, consulted by role conditions.
    #[arg(long, global = true)]
    pub role: Option<String>,

    /// Path to a JSON file with project users for name resolution.
    #[arg(long, global = true)]
    pub users: Option<String>,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a record into its full display payload (JSON on stdout).
    Convert(InputArgs),

    /// Evaluate one formula field and print its display value.
    Eval(EvalArgs),

    /// Render the record title from the workflow's title format string.
    Title(InputArgs),
}

/// Schema and record inputs shared by all subcommands.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Path to the workflow schema JSON file.
    pub schema: String,

    /// Path to the record JSON file.
    pub record: String,
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Id of the formula field to evaluate.
    #[arg(long)]
    pub field: String,
}
