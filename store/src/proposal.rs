//! Proposal storage trait.

use std::sync::Arc;

use crate::StoreError;
use coopgov_types::{Proposal, ProposalId, ProposalStatus};

pub trait ProposalStore: Send + Sync {
    /// Store a newly created proposal. Fails with `Duplicate` if the id exists.
    fn put_proposal(&self, proposal: &Proposal) -> Result<(), StoreError>;

    /// Load a proposal, `None` if unknown.
    fn load_proposal(&self, id: &ProposalId) -> Result<Option<Proposal>, StoreError>;

    /// Persist a new lifecycle status. Fails with `NotFound` if the id is unknown.
    fn save_proposal_status(&self, id: &ProposalId, status: ProposalStatus)
        -> Result<(), StoreError>;

    /// All stored proposals, in no particular order.
    fn list_proposals(&self) -> Result<Vec<Proposal>, StoreError>;
}

impl<T: ProposalStore + ?Sized> ProposalStore for Arc<T> {
    fn put_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        (**self).put_proposal(proposal)
    }

    fn load_proposal(&self, id: &ProposalId) -> Result<Option<Proposal>, StoreError> {
        (**self).load_proposal(id)
    }

    fn save_proposal_status(
        &self,
        id: &ProposalId,
        status: ProposalStatus,
    ) -> Result<(), StoreError> {
        (**self).save_proposal_status(id, status)
    }

    fn list_proposals(&self) -> Result<Vec<Proposal>, StoreError> {
        (**self).list_proposals()
    }
}
