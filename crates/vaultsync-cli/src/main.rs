//! vaultsync CLI - inspect sync decisions without a server
//!
//! Runs the same diff, quota, and conflict-naming logic the sync service
//! uses against manifest files on disk.

mod cli;
mod commands;
mod error;

use clap::Parser;

use cli::{Cli, Commands};
use commands::compare::run_compare;
use commands::completions::run_completions;
use commands::conflict_name::run_conflict_name;
use commands::diff::run_diff;
use commands::quota::{run_quota, QuotaArgs};
use error::CliError;

fn main() {
    if let Err(error) = run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vaultsync=warn".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Diff {
            local,
            remote,
            device_name,
            at,
            json,
        } => run_diff(&local, &remote, &device_name, at.as_deref(), json)?,
        Commands::Quota {
            local,
            remote,
            current_usage,
            max_file_size,
            storage_limit,
            json,
        } => run_quota(&QuotaArgs {
            local: &local,
            remote: &remote,
            current_usage,
            max_file_size,
            storage_limit,
            json,
        })?,
        Commands::ConflictName {
            path,
            device_name,
            at,
        } => run_conflict_name(&path, &device_name, at.as_deref())?,
        Commands::Compare { clock_a, clock_b } => run_compare(&clock_a, &clock_b)?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
