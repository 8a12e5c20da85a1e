//! Governance proposals and their persisted state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ProposalId, Timestamp, TypeError, VoterId};

/// How the approval ratio requirement is derived from the configured threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceModel {
    /// The configured approval threshold applies as-is.
    #[default]
    Majority,
    /// The configured threshold, but never below the supermajority floor.
    Supermajority,
}

impl GovernanceModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Majority => "majority",
            Self::Supermajority => "supermajority",
        }
    }
}

impl fmt::Display for GovernanceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GovernanceModel {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "majority" => Ok(Self::Majority),
            "supermajority" => Ok(Self::Supermajority),
            _ => Err(TypeError::InvalidGovernanceModel(s.to_string())),
        }
    }
}

/// Lifecycle status of a proposal.
///
/// `Voting` is the only non-terminal status. Transitions are owned by the
/// lifecycle state machine in the governance crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Open for votes until the deadline.
    Voting,
    /// Quorum and approval were met.
    Approved,
    /// The deadline passed without approval.
    Rejected,
    /// The deadline passed with an indeterminate outcome and the policy
    /// chose not to auto-reject.
    PendingExpired,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Voting)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voting => "voting",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::PendingExpired => "pending_expired",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voting" => Ok(Self::Voting),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "pending_expired" => Ok(Self::PendingExpired),
            _ => Err(TypeError::InvalidStatus(s.to_string())),
        }
    }
}

/// Descriptive fields carried alongside the voting rules.
///
/// The engine stores these verbatim and never uses them in a decision.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// The member who submitted the proposal.
    #[serde(default)]
    pub initiator_id: Option<VoterId>,
    /// Cooperatives with a stake in the outcome.
    #[serde(default)]
    pub stakeholder_cooperatives: Vec<String>,
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub governance_model: GovernanceModel,
    /// Fraction of eligible weight that must participate, in `[0, 1]`.
    pub quorum_threshold: f64,
    /// Fraction of cast weight that must approve, in `[0, 1]`.
    pub approval_threshold: f64,
    pub voting_deadline: Timestamp,
    pub status: ProposalStatus,
    pub created_at: Timestamp,
    pub metadata: ProposalMetadata,
}

impl Proposal {
    /// Whether a vote arriving at `now` may still be recorded.
    pub fn accepts_votes(&self, now: Timestamp) -> bool {
        self.status == ProposalStatus::Voting && !self.voting_deadline.has_passed(now)
    }

    /// Whether the voting window has closed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.voting_deadline.has_passed(now)
    }
}
