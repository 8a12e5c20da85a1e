//! Nullable store: thread-safe in-memory storage for testing.

use coopgov_store::{ProposalStore, StoreError, VoteStore, VoteWrite};
use coopgov_types::{Proposal, ProposalId, ProposalStatus, Vote};
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory proposal + vote store for testing.
///
/// Votes are kept as an append-only log per proposal; superseded votes stay
/// in the log, exactly like a durable event log would keep them.
pub struct NullGovernanceStore {
    proposals: Mutex<HashMap<ProposalId, Proposal>>,
    votes: Mutex<HashMap<ProposalId, Vec<Vote>>>,
    fail_writes: Mutex<bool>,
}

impl NullGovernanceStore {
    pub fn new() -> Self {
        Self {
            proposals: Mutex::new(HashMap::new()),
            votes: Mutex::new(HashMap::new()),
            fail_writes: Mutex::new(false),
        }
    }

    /// Make every subsequent write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    /// Number of vote records in a proposal's log, superseded ones included.
    pub fn vote_log_len(&self, proposal: &ProposalId) -> usize {
        self.votes
            .lock()
            .unwrap()
            .get(proposal)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(StoreError::Backend("write refused by null store".into()));
        }
        Ok(())
    }
}

impl Default for NullGovernanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalStore for NullGovernanceStore {
    fn put_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut proposals = self.proposals.lock().unwrap();
        if proposals.contains_key(&proposal.id) {
            return Err(StoreError::Duplicate(proposal.id.to_string()));
        }
        proposals.insert(proposal.id, proposal.clone());
        Ok(())
    }

    fn load_proposal(&self, id: &ProposalId) -> Result<Option<Proposal>, StoreError> {
        Ok(self.proposals.lock().unwrap().get(id).cloned())
    }

    fn save_proposal_status(
        &self,
        id: &ProposalId,
        status: ProposalStatus,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut proposals = self.proposals.lock().unwrap();
        match proposals.get_mut(id) {
            Some(proposal) => {
                proposal.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    fn list_proposals(&self) -> Result<Vec<Proposal>, StoreError> {
        Ok(self.proposals.lock().unwrap().values().cloned().collect())
    }
}

impl VoteStore for NullGovernanceStore {
    fn load_votes(&self, proposal: &ProposalId) -> Result<Vec<Vote>, StoreError> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .get(proposal)
            .cloned()
            .unwrap_or_default())
    }

    fn append_or_replace_vote(&self, vote: &Vote) -> Result<VoteWrite, StoreError> {
        self.check_writable()?;
        let mut votes = self.votes.lock().unwrap();
        let log = votes.entry(vote.proposal_id).or_default();
        let stale = log
            .iter()
            .any(|v| v.voter_id == vote.voter_id && v.supersedes(vote));
        log.push(vote.clone());
        Ok(if stale { VoteWrite::Stale } else { VoteWrite::Recorded })
    }
}
