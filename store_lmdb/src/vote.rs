//! LMDB implementation of VoteStore.
//!
//! Key format: `proposal_id.as_bytes() ++ voter_id.as_bytes()`. Proposal
//! ids have a fixed 16-byte width, so a prefix scan over the proposal id
//! returns exactly that proposal's votes.

use coopgov_store::{StoreError, VoteStore, VoteWrite};
use coopgov_types::{ProposalId, Vote, VoterId};

use crate::{LmdbError, LmdbGovernanceStore};

/// Build the binary composite key `proposal_bytes ++ voter_bytes`.
fn vote_key(proposal: &ProposalId, voter: &VoterId) -> Vec<u8> {
    let voter = voter.as_str().as_bytes();
    let mut key = Vec::with_capacity(16 + voter.len());
    key.extend_from_slice(proposal.as_bytes());
    key.extend_from_slice(voter);
    key
}

impl VoteStore for LmdbGovernanceStore {
    fn load_votes(&self, proposal: &ProposalId) -> Result<Vec<Vote>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .votes_db
            .prefix_iter(&rtxn, proposal.as_bytes())
            .map_err(LmdbError::from)?;
        let mut votes = Vec::new();
        for entry in iter {
            let (_key, bytes) = entry.map_err(LmdbError::from)?;
            let vote: Vote = bincode::deserialize(bytes).map_err(LmdbError::from)?;
            votes.push(vote);
        }
        Ok(votes)
    }

    /// Keeps one record per voter. A write older than the stored vote is
    /// dropped so the record always holds the voter's latest vote.
    fn append_or_replace_vote(&self, vote: &Vote) -> Result<VoteWrite, StoreError> {
        let key = vote_key(&vote.proposal_id, &vote.voter_id);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let stale = match self.votes_db.get(&wtxn, &key).map_err(LmdbError::from)? {
            Some(bytes) => {
                let existing: Vote = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                existing.supersedes(vote)
            }
            None => false,
        };
        if stale {
            tracing::debug!(
                proposal = %vote.proposal_id,
                voter = %vote.voter_id,
                "ignoring vote older than the stored one"
            );
            return Ok(VoteWrite::Stale);
        }
        let bytes = bincode::serialize(vote).map_err(LmdbError::from)?;
        self.votes_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(VoteWrite::Recorded)
    }
}
