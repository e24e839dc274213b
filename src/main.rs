//! Command-line entry point for the prima client.
//!
//! Drives the full flow headlessly: upload a CSV, inspect the profile,
//! build a recipe file, preview it, and compile it to a Python script.

use clap::Parser as _;

mod cli;

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    prima::logging::init()?;

    tokio::runtime::Runtime::new()?.block_on(cli::run_command(args))
}
