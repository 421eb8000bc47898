#![forbid(unsafe_code)]

mod cli;
mod commands;
mod error;
mod render;
mod signals;

use crate::cli::{Cli, Command};
use clap::Parser;
use config::Config;
use kernel::CheckMode;
use tracing::debug;
use tracing_log::AsTrace;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.log_level_filter().as_trace())
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    debug!(config = ?cli);

    let config = match &cli.conffile {
        Some(path) => Config::load(path)?,
        _ => Config::from_env()?,
    };

    match cli.command {
        Command::Daemon => commands::daemon(config).await,
        Command::Manual => commands::run_once(config, CheckMode::Manual).await,
        Command::Test => commands::run_once(config, CheckMode::Test).await,
        Command::Status { days } => commands::status(config, days),
        Command::Verify => commands::verify(config).await,
    }
}
