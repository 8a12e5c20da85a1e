//! LMDB implementation of ProposalStore.

use coopgov_store::{ProposalStore, StoreError};
use coopgov_types::{Proposal, ProposalId, ProposalStatus};

use crate::{LmdbError, LmdbGovernanceStore};

fn decode(bytes: &[u8]) -> Result<Proposal, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

impl ProposalStore for LmdbGovernanceStore {
    fn put_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        let key = proposal.id.as_bytes();
        let bytes = bincode::serialize(proposal).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .proposals_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(LmdbError::Duplicate(format!("proposal {}", proposal.id)).into());
        }
        self.proposals_db
            .put(&mut wtxn, key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn load_proposal(&self, id: &ProposalId) -> Result<Option<Proposal>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .proposals_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn save_proposal_status(
        &self,
        id: &ProposalId,
        status: ProposalStatus,
    ) -> Result<(), StoreError> {
        let key = id.as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut proposal = match self.proposals_db.get(&wtxn, key).map_err(LmdbError::from)? {
            Some(bytes) => decode(bytes)?,
            None => return Err(LmdbError::NotFound(format!("proposal {id}")).into()),
        };
        proposal.status = status;
        let bytes = bincode::serialize(&proposal).map_err(LmdbError::from)?;
        self.proposals_db
            .put(&mut wtxn, key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn list_proposals(&self) -> Result<Vec<Proposal>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut proposals = Vec::new();
        for entry in self.proposals_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, bytes) = entry.map_err(LmdbError::from)?;
            proposals.push(decode(bytes)?);
        }
        Ok(proposals)
    }
}
