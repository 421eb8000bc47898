#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};

/// Watches the host's public IP address and posts changes to a Discord
/// webhook, keeping a durable history of every check.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub(crate) struct Cli {
    /// Path to configuration file.
    ///
    /// When absent, configuration comes from IPNOTIFY_* environment
    /// variables layered over built-in defaults.
    #[arg(short, long, value_parser = validate_file)]
    pub(crate) conffile: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) verbosity: Verbosity<WarnLevel>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub(crate) enum Command {
    /// Run in the foreground, checking once per day at the configured time.
    Daemon,
    /// Run a single check now; always notifies, even without a change.
    Manual,
    /// Dry-run a single check: probe and evaluate, but never notify and
    /// never touch the history file.
    Test,
    /// Print the current addresses and check statistics.
    Status {
        /// Also show the address-change timeline for the last N days.
        #[arg(short, long)]
        days: Option<u32>,
    },
    /// Validate the configuration and send a test message to the webhook.
    Verify,
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}
