//! Proposal lifecycle state machine.
//!
//! ```text
//! voting ──► approved
//!    │
//!    ├─────► rejected
//!    │
//!    └─────► pending_expired
//! ```
//!
//! `voting` is the only state with outgoing edges. Every other request is an
//! [`GovernanceError::InvalidStateTransition`].

use coopgov_store::ProposalStore;
use coopgov_types::{Proposal, ProposalStatus, Timestamp};
use tracing::info;

use crate::decision::Verdict;
use crate::error::GovernanceError;

/// Validate a status change without applying it.
pub fn check_transition(
    from: ProposalStatus,
    to: ProposalStatus,
) -> Result<(), GovernanceError> {
    if from == ProposalStatus::Voting && to.is_terminal() {
        Ok(())
    } else {
        Err(GovernanceError::InvalidStateTransition { from, to })
    }
}

/// Move `proposal` to `to` and persist the new status.
///
/// The in-memory record is only updated once the store accepted the write.
pub fn transition<S: ProposalStore + ?Sized>(
    store: &S,
    proposal: &mut Proposal,
    to: ProposalStatus,
    now: Timestamp,
) -> Result<(), GovernanceError> {
    check_transition(proposal.status, to)?;
    store.save_proposal_status(&proposal.id, to)?;
    info!(
        proposal = %proposal.id,
        from = %proposal.status,
        to = %to,
        at = %now,
        "proposal status changed"
    );
    proposal.status = to;
    Ok(())
}

/// Apply the transition a verdict implies for a voting proposal.
///
/// Returns the new status, or `None` while the verdict is still pending.
pub fn settle<S: ProposalStore + ?Sized>(
    store: &S,
    proposal: &mut Proposal,
    verdict: Verdict,
    now: Timestamp,
) -> Result<Option<ProposalStatus>, GovernanceError> {
    match verdict.settled_status() {
        Some(to) => {
            transition(store, proposal, to, now)?;
            Ok(Some(to))
        }
        None => Ok(None),
    }
}
