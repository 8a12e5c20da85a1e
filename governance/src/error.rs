use coopgov_store::StoreError;
use coopgov_types::{ProposalId, ProposalStatus, Timestamp, VoteType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("proposal {id} is closed ({status})")]
    ProposalClosed { id: ProposalId, status: ProposalStatus },

    #[error("invalid vote type: {0}")]
    InvalidVoteType(String),

    #[error("invalid voter: {0}")]
    InvalidVoter(String),

    #[error("invalid vote weight {0}: must be positive and finite")]
    InvalidWeight(f64),

    #[error("invalid {name} threshold {value}: must be within [0, 1]")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("voting deadline {deadline} is not after the current time {now}")]
    InvalidDeadline { deadline: Timestamp, now: Timestamp },

    #[error("cannot delegate to self")]
    SelfDelegation,

    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: ProposalStatus,
        to: ProposalStatus,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GovernanceError {
    pub(crate) fn delegate_target_mismatch(vote_type: VoteType) -> Self {
        if vote_type == VoteType::Delegate {
            Self::InvalidVoteType("delegate vote requires a delegate_to target".into())
        } else {
            Self::InvalidVoteType(format!("{vote_type} vote cannot carry a delegate_to target"))
        }
    }
}
