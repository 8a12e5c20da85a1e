//! Cooperative governance daemon: operator CLI over the LMDB store.

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;

use coopgov_utils::{init_logging, LogFormat};

pub use error::DaemonError;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.effective_config()?;

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    commands::run(cli.command, &config)?;
    Ok(())
}
