//! mkplan - master-key planner.
//!
//! This is the entry point for the `mkplan` binary.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use masterkey_cli::{run, Cli, Status};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let filter = if cli.debug {
        EnvFilter::new("masterkey_cli=debug,masterkey_engine=debug,masterkey_store=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();
    let status = run(&cli, &mut stdout)
        .with_context(|| format!("project {}", cli.project.display()))?;

    Ok(match status {
        Status::Success => ExitCode::SUCCESS,
        Status::Invalid => ExitCode::FAILURE,
    })
}
