//! `tre` -- record display converter CLI.
//!
//! Parses CLI arguments with clap, builds the runtime context, and
//! dispatches to command handlers.

mod cli;
mod commands;
mod context;

use clap::Parser;

use cli::{Cli, Commands};
use context::RuntimeContext;

fn main() {
    let cli = Cli::parse();

    let ctx = match RuntimeContext::from_global_args(&cli.global) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    };

    // Set up logging based on verbosity
    if ctx.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("tre=debug,trellis_formula=debug,trellis_convert=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match &cli.command {
        Commands::Convert(args) => commands::convert::run(&ctx, args),
        Commands::Eval(args) => commands::eval::run(&ctx, args),
        Commands::Title(args) => commands::title_cmd::run(&ctx, args),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
