//! Parse errors for the boundary types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid vote type: {0}")]
    InvalidVoteType(String),

    #[error("invalid governance model: {0}")]
    InvalidGovernanceModel(String),

    #[error("invalid proposal id: {0}")]
    InvalidProposalId(String),

    #[error("invalid proposal status: {0}")]
    InvalidStatus(String),
}
