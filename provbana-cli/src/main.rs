//! ## provbana-cli
//! **Command line entrypoint of the scenario runner**
//!
//! `provbana validate` checks scenario files, `provbana rehearse` runs them
//! against the in-memory dry-run network.

use std::process::ExitCode;

use clap::Parser;
use provbana_telemetry::EventLogger;
use tracing::error;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = EventLogger::init(&config.logging) {
        eprintln!("failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match commands::run_command(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
