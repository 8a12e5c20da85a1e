//! Vote record storage trait.

use std::sync::Arc;

use crate::StoreError;
use coopgov_types::{ProposalId, Vote};

/// Outcome of a vote write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteWrite {
    /// The vote is now the voter's latest.
    Recorded,
    /// A stored vote by the same voter supersedes this one.
    Stale,
}

pub trait VoteStore: Send + Sync {
    /// Snapshot of every vote recorded for a proposal.
    ///
    /// The returned vector is a copy; later writes never show through it.
    /// Backends may return superseded votes as well as active ones; readers
    /// apply last-write-wins themselves.
    fn load_votes(&self, proposal: &ProposalId) -> Result<Vec<Vote>, StoreError>;

    /// Record a vote, replacing the voter's previous vote on the same proposal
    /// if the backend keeps only one per voter. Must be atomic: the vote is
    /// either fully stored or not at all.
    ///
    /// Reports [`VoteWrite::Stale`] when an already stored vote by the same
    /// voter supersedes `vote`.
    fn append_or_replace_vote(&self, vote: &Vote) -> Result<VoteWrite, StoreError>;
}

impl<T: VoteStore + ?Sized> VoteStore for Arc<T> {
    fn load_votes(&self, proposal: &ProposalId) -> Result<Vec<Vote>, StoreError> {
        (**self).load_votes(proposal)
    }

    fn append_or_replace_vote(&self, vote: &Vote) -> Result<VoteWrite, StoreError> {
        (**self).append_or_replace_vote(vote)
    }
}
