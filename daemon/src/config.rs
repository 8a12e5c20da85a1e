//! Daemon configuration with TOML file support.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use coopgov_governance::TallyPolicy;
use coopgov_store::{StakeholderRegistry, StoreError};
use coopgov_types::ProposalId;

use crate::DaemonError;

/// Configuration for the governance daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`] or built
/// from defaults; command-line flags override individual fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in megabytes.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Counting rules applied to every proposal.
    #[serde(default)]
    pub policy: TallyPolicy,

    /// Eligible voting weight per proposal.
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Eligible weight figures, keyed by proposal id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Used for proposals without their own entry. Unset means unknown,
    /// which puts participation into degraded mode.
    #[serde(default)]
    pub default_eligible_weight: Option<f64>,

    #[serde(default)]
    pub eligible_weights: BTreeMap<String, f64>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./coopgov_data")
}

fn default_map_size_mb() -> usize {
    256
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, DaemonError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DaemonError> {
        toml::from_str(s).map_err(|e| DaemonError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, DaemonError> {
        toml::to_string_pretty(self).map_err(|e| DaemonError::Config(e.to_string()))
    }

    /// LMDB map size in bytes.
    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            policy: TallyPolicy::default(),
            registry: RegistryConfig::default(),
        }
    }
}

/// Stakeholder registry backed by the `[registry]` config table.
#[derive(Clone, Debug, Default)]
pub struct ConfigRegistry {
    default: Option<f64>,
    weights: HashMap<ProposalId, f64>,
}

impl TryFrom<&RegistryConfig> for ConfigRegistry {
    type Error = DaemonError;

    fn try_from(config: &RegistryConfig) -> Result<Self, Self::Error> {
        let weights = config
            .eligible_weights
            .iter()
            .map(|(id, weight)| {
                let id: ProposalId = id.parse().map_err(|e| {
                    DaemonError::Config(format!("registry.eligible_weights: {e}"))
                })?;
                Ok((id, *weight))
            })
            .collect::<Result<HashMap<_, _>, DaemonError>>()?;
        Ok(Self {
            default: config.default_eligible_weight,
            weights,
        })
    }
}

impl StakeholderRegistry for ConfigRegistry {
    fn total_eligible_weight(&self, proposal: &ProposalId) -> Result<Option<f64>, StoreError> {
        Ok(self.weights.get(proposal).copied().or(self.default))
    }
}
