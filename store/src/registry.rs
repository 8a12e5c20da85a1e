//! Stakeholder registry trait.
//!
//! The registry knows how much voting weight is eligible on a proposal. It is
//! optional: when it has no figure the engine falls back to a degraded
//! participation estimate.

use std::sync::Arc;

use crate::StoreError;
use coopgov_types::ProposalId;

pub trait StakeholderRegistry: Send + Sync {
    /// Total eligible voting weight for a proposal, `None` if unknown.
    fn total_eligible_weight(&self, proposal: &ProposalId) -> Result<Option<f64>, StoreError>;
}

impl<T: StakeholderRegistry + ?Sized> StakeholderRegistry for Arc<T> {
    fn total_eligible_weight(&self, proposal: &ProposalId) -> Result<Option<f64>, StoreError> {
        (**self).total_eligible_weight(proposal)
    }
}

/// A registry that never knows the eligible weight.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRegistry;

impl StakeholderRegistry for NoRegistry {
    fn total_eligible_weight(&self, _proposal: &ProposalId) -> Result<Option<f64>, StoreError> {
        Ok(None)
    }
}
