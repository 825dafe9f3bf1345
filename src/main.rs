//! Strata - transactional state store for a tiling desktop environment
//!
//! Binary entry point: logging from the environment, then the CLI.

use clap::Parser;
use std::process::ExitCode;
use strata::cli::{run_cli, StrataCli};
use strata::logging::{init_logging, LogConfig};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = StrataCli::parse();

    let mut log_config = LogConfig::from_env();
    log_config.level = log_config.level.raised_by(cli.verbose);
    if let Err(err) = init_logging(&log_config) {
        eprintln!("strata: logging disabled: {err:#}");
    }

    match run_cli(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Command failed");
            eprintln!("strata: {err:#}");
            ExitCode::FAILURE
        }
    }
}
