//! Tally policy: the configurable parts of the counting rules.
//!
//! Loaded from the `[policy]` table of the daemon's TOML configuration or
//! built programmatically. Every field has a default, so an empty table is
//! a valid policy.

use serde::{Deserialize, Serialize};

/// What happens to a proposal whose deadline passes without approval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Expiry always ends in `approved` or `rejected`.
    #[default]
    ForceDecision,
    /// An expired proposal that never reached quorum is parked as
    /// `pending_expired` instead of being rejected.
    MarkPendingExpired,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyPolicy {
    /// Count weight from unresolved delegations toward participation (quorum).
    #[serde(default)]
    pub unresolved_counts_toward_participation: bool,

    /// Count objection weight toward participation (quorum).
    #[serde(default = "default_true")]
    pub objections_count_toward_quorum: bool,

    #[serde(default)]
    pub expiry: ExpiryPolicy,

    /// Longest delegation chain followed before giving up; unlimited if unset.
    #[serde(default)]
    pub max_delegation_depth: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl Default for TallyPolicy {
    fn default() -> Self {
        Self {
            unresolved_counts_toward_participation: false,
            objections_count_toward_quorum: default_true(),
            expiry: ExpiryPolicy::default(),
            max_delegation_depth: None,
        }
    }
}
