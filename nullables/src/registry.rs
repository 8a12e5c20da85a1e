//! Nullable stakeholder registry: programmable eligible weights.

use coopgov_store::{StakeholderRegistry, StoreError};
use coopgov_types::ProposalId;
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory stakeholder registry for testing.
///
/// Answers with a per-proposal weight if one was set, otherwise the default
/// (which starts out unknown).
pub struct NullRegistry {
    default_weight: Mutex<Option<f64>>,
    per_proposal: Mutex<HashMap<ProposalId, f64>>,
}

impl NullRegistry {
    /// A registry that knows nothing, forcing degraded participation.
    pub fn new() -> Self {
        Self {
            default_weight: Mutex::new(None),
            per_proposal: Mutex::new(HashMap::new()),
        }
    }

    /// A registry reporting the same eligible weight for every proposal.
    pub fn with_default(weight: f64) -> Self {
        let registry = Self::new();
        registry.set_default(Some(weight));
        registry
    }

    pub fn set_default(&self, weight: Option<f64>) {
        *self.default_weight.lock().unwrap() = weight;
    }

    pub fn set_eligible_weight(&self, proposal: ProposalId, weight: f64) {
        self.per_proposal.lock().unwrap().insert(proposal, weight);
    }
}

impl Default for NullRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StakeholderRegistry for NullRegistry {
    fn total_eligible_weight(&self, proposal: &ProposalId) -> Result<Option<f64>, StoreError> {
        if let Some(weight) = self.per_proposal.lock().unwrap().get(proposal) {
            return Ok(Some(*weight));
        }
        Ok(*self.default_weight.lock().unwrap())
    }
}
