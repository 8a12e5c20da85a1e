//! Governance engine: the operations the API layer drives.
//!
//! The engine owns no data. Proposals and votes live behind the store traits,
//! eligible weight comes from the stakeholder registry, and time comes from
//! the injected clock. Writes to one proposal are serialised through a
//! per-proposal lock; reads work on copied snapshots and never block writers
//! of other proposals.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use coopgov_store::{ProposalStore, StakeholderRegistry, VoteStore, VoteWrite};
use coopgov_types::{
    Clock, GovernanceModel, Proposal, ProposalId, ProposalMetadata, ProposalStatus, Timestamp,
    Vote, VoteType, VoterId,
};
use coopgov_utils::format_duration;
use coopgov_utils::tracing_spans::{
    cast_vote_span, create_proposal_span, results_span, sweep_span,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::decision::{decide, Decision, Verdict};
use crate::delegation::UnresolvedDelegation;
use crate::error::GovernanceError;
use crate::lifecycle;
use crate::policy::TallyPolicy;
use crate::tally::Tally;

/// Parameters of a proposal to create.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewProposal {
    pub governance_model: GovernanceModel,
    pub quorum_threshold: f64,
    pub approval_threshold: f64,
    pub voting_deadline: Timestamp,
    #[serde(default)]
    pub metadata: ProposalMetadata,
}

/// A vote submission as received from the API layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ballot {
    pub proposal_id: ProposalId,
    pub voter_id: VoterId,
    pub vote_type: VoteType,
    pub weight: f64,
    pub delegate_to: Option<VoterId>,
}

impl Ballot {
    /// A ballot with the default weight of 1.
    pub fn new(proposal_id: ProposalId, voter_id: impl Into<VoterId>, vote_type: VoteType) -> Self {
        Self {
            proposal_id,
            voter_id: voter_id.into(),
            vote_type,
            weight: coopgov_types::vote::DEFAULT_WEIGHT,
            delegate_to: None,
        }
    }

    /// A delegation ballot handing this voter's weight to `to`.
    pub fn delegate(
        proposal_id: ProposalId,
        voter_id: impl Into<VoterId>,
        to: impl Into<VoterId>,
    ) -> Self {
        Self {
            delegate_to: Some(to.into()),
            ..Self::new(proposal_id, voter_id, VoteType::Delegate)
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Boundary checks that need no stored state.
    fn validate(&self) -> Result<(), GovernanceError> {
        if !self.voter_id.is_valid() {
            return Err(GovernanceError::InvalidVoter(
                "voter id must not be empty".into(),
            ));
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(GovernanceError::InvalidWeight(self.weight));
        }
        match (&self.vote_type, &self.delegate_to) {
            (VoteType::Delegate, Some(to)) if to == &self.voter_id => {
                Err(GovernanceError::SelfDelegation)
            }
            (VoteType::Delegate, Some(to)) if !to.is_valid() => Err(
                GovernanceError::InvalidVoter("delegate_to must not be empty".into()),
            ),
            (VoteType::Delegate, Some(_)) => Ok(()),
            (VoteType::Delegate, None) | (_, Some(_)) => {
                Err(GovernanceError::delegate_target_mismatch(self.vote_type))
            }
            (_, None) => Ok(()),
        }
    }
}

/// Everything a caller needs to know about where a proposal stands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalResults {
    pub proposal_id: ProposalId,
    pub approve_weight: f64,
    pub reject_weight: f64,
    pub abstain_weight: f64,
    pub object_weight: f64,
    pub unresolved_weight: f64,
    pub total_cast_weight: f64,
    pub participation: f64,
    pub degraded: bool,
    pub approval_ratio: f64,
    pub required_approval: f64,
    pub quorum_met: bool,
    pub approval_met: bool,
    pub verdict: Verdict,
    pub status: ProposalStatus,
    pub unresolved: Vec<UnresolvedDelegation>,
}

impl ProposalResults {
    fn new(proposal: &Proposal, tally: Tally, decision: Decision) -> Self {
        // A settled proposal reports the verdict it was settled with.
        let verdict = Verdict::from_terminal(proposal.status).unwrap_or(decision.verdict);
        Self {
            proposal_id: proposal.id,
            approve_weight: tally.approve_weight,
            reject_weight: tally.reject_weight,
            abstain_weight: tally.abstain_weight,
            object_weight: tally.object_weight,
            unresolved_weight: tally.unresolved_weight,
            total_cast_weight: tally.total_cast_weight,
            participation: decision.participation,
            degraded: decision.degraded,
            approval_ratio: decision.approval_ratio,
            required_approval: decision.required_approval,
            quorum_met: decision.quorum_met,
            approval_met: decision.approval_met,
            verdict,
            status: proposal.status,
            unresolved: tally.unresolved,
        }
    }
}

/// Drives proposals through voting and tallying.
pub struct GovernanceEngine<S, R, C> {
    store: S,
    registry: R,
    clock: C,
    policy: TallyPolicy,
    /// Per-proposal write locks.
    locks: Mutex<HashMap<ProposalId, Arc<Mutex<()>>>>,
}

impl<S, R, C> GovernanceEngine<S, R, C>
where
    S: ProposalStore + VoteStore,
    R: StakeholderRegistry,
    C: Clock,
{
    pub fn new(store: S, registry: R, clock: C, policy: TallyPolicy) -> Self {
        Self {
            store,
            registry,
            clock,
            policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Create a proposal open for voting until its deadline.
    pub fn create_proposal(&self, new: NewProposal) -> Result<ProposalId, GovernanceError> {
        check_threshold("quorum", new.quorum_threshold)?;
        check_threshold("approval", new.approval_threshold)?;
        let now = self.clock.now();
        if new.voting_deadline.has_passed(now) {
            return Err(GovernanceError::InvalidDeadline {
                deadline: new.voting_deadline,
                now,
            });
        }

        let proposal = Proposal {
            id: ProposalId::generate(),
            governance_model: new.governance_model,
            quorum_threshold: new.quorum_threshold,
            approval_threshold: new.approval_threshold,
            voting_deadline: new.voting_deadline,
            status: ProposalStatus::Voting,
            created_at: now,
            metadata: new.metadata,
        };
        let _span = create_proposal_span(&proposal.id.to_string()).entered();
        self.store.put_proposal(&proposal)?;
        info!(
            model = %proposal.governance_model,
            quorum = proposal.quorum_threshold,
            approval = proposal.approval_threshold,
            closes_in = %format_duration(proposal.voting_deadline.secs_until(now)),
            title = %proposal.metadata.title,
            "proposal created"
        );
        Ok(proposal.id)
    }

    /// Record a vote, superseding any earlier vote by the same voter.
    ///
    /// The vote is either stored in full or not at all. Returns what the
    /// store did with it; [`VoteWrite::Stale`] means a stored vote by the same
    /// voter is newer, which only happens when the clock stepped backwards.
    pub fn cast_vote(&self, ballot: Ballot) -> Result<VoteWrite, GovernanceError> {
        let _span =
            cast_vote_span(&ballot.proposal_id.to_string(), ballot.voter_id.as_str()).entered();
        ballot.validate()?;

        let lock = self.proposal_lock(&ballot.proposal_id);
        let _guard = lock_ignoring_poison(&lock);

        let mut proposal = self.load(&ballot.proposal_id)?;
        let now = self.clock.now();
        if !proposal.accepts_votes(now) {
            if !proposal.status.is_terminal() {
                // The deadline passed while the proposal was still open.
                self.settle_locked(&mut proposal, now)?;
            }
            if proposal.status.is_terminal() {
                self.release_lock(&proposal.id);
            }
            debug!(status = %proposal.status, "vote refused, proposal closed");
            return Err(GovernanceError::ProposalClosed {
                id: proposal.id,
                status: proposal.status,
            });
        }

        let votes = self.store.load_votes(&proposal.id)?;
        let sequence = votes.iter().map(|v| v.sequence).max().unwrap_or(0) + 1;
        let vote = Vote {
            proposal_id: proposal.id,
            voter_id: ballot.voter_id,
            vote_type: ballot.vote_type,
            weight: ballot.weight,
            delegate_to: ballot.delegate_to,
            cast_at: now,
            sequence,
        };
        let outcome = self.store.append_or_replace_vote(&vote)?;
        match outcome {
            VoteWrite::Recorded => debug!(
                vote_type = %vote.vote_type,
                weight = vote.weight,
                delegate_to = vote.delegate_to.as_ref().map(VoterId::as_str),
                sequence,
                "vote recorded"
            ),
            VoteWrite::Stale => warn!(
                vote_type = %vote.vote_type,
                cast_at = %vote.cast_at,
                "vote not recorded, a newer vote by this voter is stored"
            ),
        }
        Ok(outcome)
    }

    /// Current results, applying any lifecycle transition the verdict implies.
    ///
    /// Calling this repeatedly without new votes returns the same output.
    pub fn get_results(&self, id: &ProposalId) -> Result<ProposalResults, GovernanceError> {
        let _span = results_span(&id.to_string()).entered();
        let proposal = self.load(id)?;
        let now = self.clock.now();
        let (tally, decision) = self.evaluate(&proposal, now)?;

        if proposal.status.is_terminal() || decision.verdict.settled_status().is_none() {
            return Ok(ProposalResults::new(&proposal, tally, decision));
        }

        // Settle under the write lock, against a fresh snapshot.
        let lock = self.proposal_lock(id);
        let _guard = lock_ignoring_poison(&lock);
        let mut proposal = self.load(id)?;
        let (tally, decision) = self.evaluate(&proposal, now)?;
        if !proposal.status.is_terminal() {
            lifecycle::settle(&self.store, &mut proposal, decision.verdict, now)?;
        }
        if proposal.status.is_terminal() {
            self.release_lock(id);
        }
        Ok(ProposalResults::new(&proposal, tally, decision))
    }

    /// Current results without persisting anything.
    pub fn preview_results(&self, id: &ProposalId) -> Result<ProposalResults, GovernanceError> {
        let proposal = self.load(id)?;
        let (tally, decision) = self.evaluate(&proposal, self.clock.now())?;
        Ok(ProposalResults::new(&proposal, tally, decision))
    }

    /// Settle every voting proposal whose deadline has passed.
    ///
    /// Returns the proposals that changed status, ordered by id.
    pub fn finalize_expired(&self) -> Result<Vec<(ProposalId, ProposalStatus)>, GovernanceError> {
        let _span = sweep_span().entered();
        let now = self.clock.now();
        let mut overdue: Vec<ProposalId> = self
            .store
            .list_proposals()?
            .into_iter()
            .filter(|p| p.status == ProposalStatus::Voting && p.is_expired(now))
            .map(|p| p.id)
            .collect();
        overdue.sort();

        let mut settled = Vec::new();
        for id in overdue {
            let lock = self.proposal_lock(&id);
            let _guard = lock_ignoring_poison(&lock);
            let mut proposal = self.load(&id)?;
            if !proposal.status.is_terminal() {
                if let Some(status) = self.settle_locked(&mut proposal, now)? {
                    settled.push((id, status));
                }
            }
            if proposal.status.is_terminal() {
                self.release_lock(&id);
            }
        }
        info!(count = settled.len(), "expired proposals settled");
        Ok(settled)
    }

    pub fn get_proposal(&self, id: &ProposalId) -> Result<Proposal, GovernanceError> {
        self.load(id)
    }

    /// Every recorded vote on a proposal, superseded ones included, oldest first.
    pub fn list_votes(&self, id: &ProposalId) -> Result<Vec<Vote>, GovernanceError> {
        self.load(id)?;
        let mut votes = self.store.load_votes(id)?;
        votes.sort_by_key(|v| (v.cast_at, v.sequence));
        Ok(votes)
    }

    fn load(&self, id: &ProposalId) -> Result<Proposal, GovernanceError> {
        self.store
            .load_proposal(id)?
            .ok_or(GovernanceError::ProposalNotFound(*id))
    }

    /// Resolve, tally and decide over the current vote snapshot.
    fn evaluate(
        &self,
        proposal: &Proposal,
        now: Timestamp,
    ) -> Result<(Tally, Decision), GovernanceError> {
        let votes = self.store.load_votes(&proposal.id)?;
        let tally = Tally::from_votes(&votes, &self.policy);
        let eligible = self.registry.total_eligible_weight(&proposal.id)?;
        let decision = decide(proposal, &tally, eligible, &self.policy, now);

        for diagnostic in &tally.unresolved {
            warn!(proposal = %proposal.id, "{diagnostic}");
        }
        if decision.degraded && tally.voter_count() > 0 {
            warn!(
                proposal = %proposal.id,
                "eligible weight unavailable, participation estimated from vote count"
            );
        }
        Ok((tally, decision))
    }

    /// Evaluate and settle a voting proposal. Caller holds the proposal lock.
    fn settle_locked(
        &self,
        proposal: &mut Proposal,
        now: Timestamp,
    ) -> Result<Option<ProposalStatus>, GovernanceError> {
        let (_, decision) = self.evaluate(proposal, now)?;
        lifecycle::settle(&self.store, proposal, decision.verdict, now)
    }

    fn proposal_lock(&self, id: &ProposalId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(*id).or_default())
    }

    /// Forget the lock of a terminal proposal. Writers re-check the status
    /// under the lock, so a caller still holding the old one changes nothing.
    fn release_lock(&self, id: &ProposalId) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), GovernanceError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GovernanceError::InvalidThreshold { name, value })
    }
}

/// The per-proposal locks guard no data, so a poisoned lock is still usable.
fn lock_ignoring_poison(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballot() -> Ballot {
        Ballot::new(ProposalId::from_bytes([5; 16]), "alice", VoteType::Approve)
    }

    #[test]
    fn ballot_defaults_to_unit_weight() {
        assert_eq!(ballot().weight, 1.0);
        assert!(ballot().validate().is_ok());
    }

    #[test]
    fn non_positive_or_non_finite_weight_is_invalid() {
        for weight in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ballot().with_weight(weight).validate(),
                Err(GovernanceError::InvalidWeight(_))
            ));
        }
    }

    #[test]
    fn delegate_needs_a_target_and_others_must_not_have_one() {
        let mut missing = ballot();
        missing.vote_type = VoteType::Delegate;
        assert!(matches!(
            missing.validate(),
            Err(GovernanceError::InvalidVoteType(_))
        ));

        let mut stray = ballot();
        stray.delegate_to = Some(VoterId::new("bob"));
        assert!(matches!(
            stray.validate(),
            Err(GovernanceError::InvalidVoteType(_))
        ));

        let ok = Ballot::delegate(ProposalId::from_bytes([5; 16]), "alice", "bob");
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn self_delegation_is_refused_at_the_boundary() {
        let b = Ballot::delegate(ProposalId::from_bytes([5; 16]), "alice", "alice");
        assert!(matches!(b.validate(), Err(GovernanceError::SelfDelegation)));
    }

    #[test]
    fn blank_voter_is_refused() {
        let b = Ballot::new(ProposalId::from_bytes([5; 16]), " ", VoteType::Approve);
        assert!(matches!(b.validate(), Err(GovernanceError::InvalidVoter(_))));

        let blank_target = Ballot::delegate(ProposalId::from_bytes([5; 16]), "alice", "  ");
        assert!(matches!(
            blank_target.validate(),
            Err(GovernanceError::InvalidVoter(_))
        ));
    }

    #[test]
    fn settled_proposals_release_their_lock() {
        use coopgov_nullables::{NullClock, NullGovernanceStore, NullRegistry};

        let clock = Arc::new(NullClock::new(100));
        let engine = GovernanceEngine::new(
            NullGovernanceStore::new(),
            NullRegistry::with_default(2.0),
            Arc::clone(&clock),
            TallyPolicy::default(),
        );
        let new = |deadline| NewProposal {
            governance_model: GovernanceModel::Majority,
            quorum_threshold: 0.5,
            approval_threshold: 0.5,
            voting_deadline: Timestamp::new(deadline),
            metadata: ProposalMetadata::default(),
        };
        let quick = engine.create_proposal(new(200)).unwrap();
        let slow = engine.create_proposal(new(500)).unwrap();

        engine.cast_vote(Ballot::new(quick, "a", VoteType::Approve)).unwrap();
        engine.cast_vote(Ballot::new(slow, "a", VoteType::Approve)).unwrap();
        assert_eq!(engine.tracked_locks(), 2);

        engine.cast_vote(Ballot::new(quick, "b", VoteType::Approve)).unwrap();
        assert_eq!(engine.get_results(&quick).unwrap().status, ProposalStatus::Approved);
        assert_eq!(engine.tracked_locks(), 1);

        // A refused vote on a settled proposal leaves nothing behind.
        assert!(engine
            .cast_vote(Ballot::new(quick, "c", VoteType::Reject))
            .is_err());
        assert_eq!(engine.tracked_locks(), 1);

        clock.set(500);
        assert_eq!(engine.finalize_expired().unwrap().len(), 1);
        assert_eq!(engine.tracked_locks(), 0);
    }

    #[test]
    fn thresholds_outside_unit_interval_are_refused() {
        assert!(check_threshold("quorum", 0.0).is_ok());
        assert!(check_threshold("quorum", 1.0).is_ok());
        assert!(check_threshold("quorum", 1.01).is_err());
        assert!(check_threshold("quorum", -0.1).is_err());
        assert!(check_threshold("quorum", f64::NAN).is_err());
    }
}
