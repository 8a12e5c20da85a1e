//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use coopgov_types::{GovernanceModel, ProposalId, VoteType};

use crate::config::DaemonConfig;
use crate::DaemonError;

#[derive(Debug, Parser)]
#[command(name = "coopgov-daemon", about = "Cooperative governance proposals and voting")]
pub struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "COOPGOV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "COOPGOV_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "COOPGOV_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "COOPGOV_LOG_FORMAT")]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open a new proposal for voting.
    Propose {
        /// "majority" or "supermajority".
        #[arg(long, default_value = "majority")]
        model: GovernanceModel,

        /// Share of eligible weight that must participate, in [0, 1].
        #[arg(long)]
        quorum: f64,

        /// Share of cast weight that must approve, in [0, 1].
        #[arg(long)]
        approval: f64,

        /// Voting deadline as Unix seconds.
        #[arg(long, conflicts_with = "closes_in", required_unless_present = "closes_in")]
        deadline: Option<u64>,

        /// Seconds from now until the voting deadline.
        #[arg(long)]
        closes_in: Option<u64>,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Voter id of the member raising the proposal.
        #[arg(long)]
        initiator: Option<String>,

        /// Cooperative with a stake in the outcome (repeatable).
        #[arg(long = "cooperative")]
        cooperatives: Vec<String>,
    },

    /// Cast or replace a vote.
    Vote {
        proposal: ProposalId,
        voter: String,
        /// approve|yes, reject|no, abstain, object, delegate.
        vote_type: VoteType,
        #[arg(long, default_value_t = 1.0)]
        weight: f64,
        /// Voter receiving this vote's weight; required for "delegate".
        #[arg(long)]
        delegate_to: Option<String>,
    },

    /// Tally a proposal, settling it if the verdict is final.
    Results {
        proposal: ProposalId,
        /// Report without changing the proposal's status.
        #[arg(long)]
        preview: bool,
    },

    /// Show a proposal record.
    Show {
        proposal: ProposalId,
        /// Include every recorded vote.
        #[arg(long)]
        votes: bool,
    },

    /// Settle every proposal whose deadline has passed.
    Sweep,

    /// Print the effective configuration.
    Config,
}

impl Cli {
    /// Build the effective configuration: file settings, then CLI overrides.
    pub fn effective_config(&self) -> Result<DaemonConfig, DaemonError> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        Ok(config)
    }
}
