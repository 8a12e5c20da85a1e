//! Cast votes as recorded by the vote store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ProposalId, Timestamp, TypeError, VoterId};

/// What a voter chose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    #[serde(alias = "yes")]
    Approve,
    #[serde(alias = "no")]
    Reject,
    Abstain,
    /// Hand this voter's weight to another voter's decision.
    Delegate,
    /// A formal objection, kept distinct from `Reject` for the record.
    Object,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Abstain => "abstain",
            Self::Delegate => "delegate",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" | "yes" => Ok(Self::Approve),
            "reject" | "no" => Ok(Self::Reject),
            "abstain" => Ok(Self::Abstain),
            "delegate" => Ok(Self::Delegate),
            "object" => Ok(Self::Object),
            _ => Err(TypeError::InvalidVoteType(s.to_string())),
        }
    }
}

/// Voting power used when the caller does not supply one.
pub const DEFAULT_WEIGHT: f64 = 1.0;

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

/// A vote cast on a proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: ProposalId,
    pub voter_id: VoterId,
    pub vote_type: VoteType,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Set only for [`VoteType::Delegate`].
    #[serde(default)]
    pub delegate_to: Option<VoterId>,
    pub cast_at: Timestamp,
    /// Per-proposal write counter, breaks ties between votes cast in the same second.
    #[serde(default)]
    pub sequence: u64,
}

impl Vote {
    /// Whether this vote replaces `other` under last-write-wins.
    pub fn supersedes(&self, other: &Vote) -> bool {
        (self.cast_at, self.sequence) > (other.cast_at, other.sequence)
    }
}
