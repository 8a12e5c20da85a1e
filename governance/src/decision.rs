//! Quorum/approval decision: turn a tally and a proposal's rules into a verdict.
//!
//! Pure: the same proposal, tally, eligible weight, policy and time always
//! give the same [`Decision`]. Persisting the outcome is the lifecycle's job.

use coopgov_types::{GovernanceModel, Proposal, ProposalStatus, Timestamp};
use serde::{Deserialize, Serialize};

use crate::policy::{ExpiryPolicy, TallyPolicy};
use crate::tally::Tally;

/// Minimum approval ratio under the supermajority model, whatever the
/// configured threshold.
pub const SUPERMAJORITY_FLOOR: f64 = 0.66;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Quorum and approval are both met.
    Approved,
    /// Not approved yet and the deadline has not passed.
    Pending,
    /// The deadline passed without approval.
    Rejected,
    /// The deadline passed without quorum and the policy parks the proposal.
    PendingExpired,
}

impl Verdict {
    /// The lifecycle status this verdict settles a voting proposal into.
    pub fn settled_status(&self) -> Option<ProposalStatus> {
        match self {
            Self::Approved => Some(ProposalStatus::Approved),
            Self::Rejected => Some(ProposalStatus::Rejected),
            Self::PendingExpired => Some(ProposalStatus::PendingExpired),
            Self::Pending => None,
        }
    }

    /// The verdict a terminal status stands for.
    pub fn from_terminal(status: ProposalStatus) -> Option<Self> {
        match status {
            ProposalStatus::Approved => Some(Self::Approved),
            ProposalStatus::Rejected => Some(Self::Rejected),
            ProposalStatus::PendingExpired => Some(Self::PendingExpired),
            ProposalStatus::Voting => None,
        }
    }
}

/// The outcome of applying a proposal's rules to a tally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub participation: f64,
    /// Participation was estimated from vote counts because the eligible
    /// weight was unavailable.
    pub degraded: bool,
    pub quorum_met: bool,
    pub approval_ratio: f64,
    pub required_approval: f64,
    pub approval_met: bool,
    pub verdict: Verdict,
}

/// Approval ratio a proposal needs under its governance model.
pub fn required_approval(model: GovernanceModel, approval_threshold: f64) -> f64 {
    match model {
        GovernanceModel::Majority => approval_threshold,
        GovernanceModel::Supermajority => approval_threshold.max(SUPERMAJORITY_FLOOR),
    }
}

/// Participation ratio and whether it was computed in degraded mode.
///
/// With a usable eligible weight this is participating weight over eligible
/// weight. Otherwise it falls back to the share of voters whose vote counts.
pub fn participation(tally: &Tally, eligible_weight: Option<f64>, policy: &TallyPolicy) -> (f64, bool) {
    match eligible_weight.filter(|w| w.is_finite() && *w > 0.0) {
        Some(eligible) => (tally.participating_weight(policy) / eligible, false),
        None => {
            let voters = tally.voter_count();
            if voters == 0 {
                (0.0, true)
            } else {
                (tally.participating_voters(policy) as f64 / voters as f64, true)
            }
        }
    }
}

/// Apply `proposal`'s quorum and approval rules to `tally` at time `now`.
pub fn decide(
    proposal: &Proposal,
    tally: &Tally,
    eligible_weight: Option<f64>,
    policy: &TallyPolicy,
    now: Timestamp,
) -> Decision {
    let (participation, degraded) = participation(tally, eligible_weight, policy);
    let quorum_met = participation >= proposal.quorum_threshold;

    let approval_ratio = tally.approval_ratio();
    let required_approval = required_approval(proposal.governance_model, proposal.approval_threshold);
    let approval_met = tally.total_cast_weight > 0.0 && approval_ratio >= required_approval;

    let verdict = if quorum_met && approval_met {
        Verdict::Approved
    } else if !proposal.is_expired(now) {
        Verdict::Pending
    } else if !quorum_met && policy.expiry == ExpiryPolicy::MarkPendingExpired {
        Verdict::PendingExpired
    } else {
        Verdict::Rejected
    };

    Decision {
        participation,
        degraded,
        quorum_met,
        approval_ratio,
        required_approval,
        approval_met,
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coopgov_types::{ProposalId, ProposalMetadata, Vote, VoteType, VoterId};

    const DEADLINE: u64 = 1_000;

    fn proposal(model: GovernanceModel, quorum: f64, approval: f64) -> Proposal {
        Proposal {
            id: ProposalId::from_bytes([4; 16]),
            governance_model: model,
            quorum_threshold: quorum,
            approval_threshold: approval,
            voting_deadline: Timestamp::new(DEADLINE),
            status: ProposalStatus::Voting,
            created_at: Timestamp::new(0),
            metadata: ProposalMetadata::default(),
        }
    }

    fn tally_of(choices: &[(VoteType, f64)]) -> Tally {
        let votes: Vec<Vote> = choices
            .iter()
            .enumerate()
            .map(|(i, (vote_type, weight))| Vote {
                proposal_id: ProposalId::from_bytes([4; 16]),
                voter_id: VoterId::new(format!("v{i}")),
                vote_type: *vote_type,
                weight: *weight,
                delegate_to: None,
                cast_at: Timestamp::new(1),
                sequence: i as u64,
            })
            .collect();
        Tally::from_votes(&votes, &TallyPolicy::default())
    }

    fn before() -> Timestamp {
        Timestamp::new(DEADLINE - 1)
    }

    fn after() -> Timestamp {
        Timestamp::new(DEADLINE)
    }

    #[test]
    fn four_of_five_with_half_quorum_is_approved() {
        let p = proposal(GovernanceModel::Majority, 0.5, 0.5);
        let tally = tally_of(&[
            (VoteType::Approve, 1.0),
            (VoteType::Approve, 1.0),
            (VoteType::Approve, 1.0),
            (VoteType::Approve, 1.0),
            (VoteType::Reject, 1.0),
        ]);
        let d = decide(&p, &tally, Some(10.0), &TallyPolicy::default(), before());

        assert_eq!(d.participation, 0.5);
        assert!(d.quorum_met);
        assert_eq!(d.approval_ratio, 0.8);
        assert!(d.approval_met);
        assert!(!d.degraded);
        assert_eq!(d.verdict, Verdict::Approved);
    }

    #[test]
    fn missing_quorum_is_pending_then_rejected() {
        let p = proposal(GovernanceModel::Majority, 0.5, 0.5);
        let tally = tally_of(&[
            (VoteType::Approve, 1.0),
            (VoteType::Approve, 1.0),
            (VoteType::Approve, 1.0),
        ]);
        let policy = TallyPolicy::default();

        let d = decide(&p, &tally, Some(10.0), &policy, before());
        assert!((d.participation - 0.3).abs() < 1e-12);
        assert!(!d.quorum_met);
        assert!(d.approval_met);
        assert_eq!(d.verdict, Verdict::Pending);

        let d = decide(&p, &tally, Some(10.0), &policy, after());
        assert_eq!(d.verdict, Verdict::Rejected);
    }

    #[test]
    fn approval_at_the_deadline_still_counts() {
        let p = proposal(GovernanceModel::Majority, 0.1, 0.5);
        let tally = tally_of(&[(VoteType::Approve, 1.0)]);
        let d = decide(&p, &tally, Some(5.0), &TallyPolicy::default(), after());
        assert_eq!(d.verdict, Verdict::Approved);
    }

    #[test]
    fn supermajority_imposes_floor() {
        assert_eq!(required_approval(GovernanceModel::Supermajority, 0.5), 0.66);
        assert_eq!(required_approval(GovernanceModel::Supermajority, 0.75), 0.75);
        assert_eq!(required_approval(GovernanceModel::Majority, 0.5), 0.5);

        let p = proposal(GovernanceModel::Supermajority, 0.0, 0.5);
        let policy = TallyPolicy::default();

        // 65% approve: enough for a majority, not for the floor
        let short = tally_of(&[(VoteType::Approve, 65.0), (VoteType::Reject, 35.0)]);
        assert!(!decide(&p, &short, Some(100.0), &policy, before()).approval_met);

        let enough = tally_of(&[(VoteType::Approve, 2.0), (VoteType::Reject, 1.0)]);
        let d = decide(&p, &enough, Some(3.0), &policy, before());
        assert!(d.approval_met);
        assert_eq!(d.verdict, Verdict::Approved);
    }

    #[test]
    fn nothing_cast_never_approves() {
        let p = proposal(GovernanceModel::Majority, 0.0, 0.0);
        let d = decide(&p, &Tally::default(), Some(10.0), &TallyPolicy::default(), before());
        assert!(d.quorum_met);
        assert_eq!(d.approval_ratio, 0.0);
        assert!(!d.approval_met);
        assert_eq!(d.verdict, Verdict::Pending);
    }

    #[test]
    fn abstentions_dilute_the_ratio_but_objections_do_not() {
        let p = proposal(GovernanceModel::Majority, 0.0, 0.6);
        let policy = TallyPolicy::default();

        let with_abstain = tally_of(&[(VoteType::Approve, 1.0), (VoteType::Abstain, 1.0)]);
        assert!(!decide(&p, &with_abstain, Some(2.0), &policy, before()).approval_met);

        let with_object = tally_of(&[(VoteType::Approve, 1.0), (VoteType::Object, 1.0)]);
        let d = decide(&p, &with_object, Some(2.0), &policy, before());
        assert!(d.approval_met);
        assert_eq!(d.participation, 1.0);
    }

    #[test]
    fn unknown_eligible_weight_uses_degraded_proxy() {
        let p = proposal(GovernanceModel::Majority, 0.5, 0.5);
        let tally = tally_of(&[(VoteType::Approve, 1.0), (VoteType::Reject, 1.0)]);
        let policy = TallyPolicy::default();

        for eligible in [None, Some(0.0), Some(-3.0), Some(f64::NAN)] {
            let d = decide(&p, &tally, eligible, &policy, before());
            assert!(d.degraded);
            assert_eq!(d.participation, 1.0);
        }
        let empty = decide(&p, &Tally::default(), None, &policy, before());
        assert_eq!(empty.participation, 0.0);
    }

    #[test]
    fn degraded_proxy_leaves_out_objectors_when_they_do_not_count() {
        let p = proposal(GovernanceModel::Majority, 0.5, 0.5);
        let tally = tally_of(&[
            (VoteType::Approve, 1.0),
            (VoteType::Object, 1.0),
            (VoteType::Object, 1.0),
            (VoteType::Object, 1.0),
        ]);
        let strict = TallyPolicy {
            objections_count_toward_quorum: false,
            ..TallyPolicy::default()
        };

        let known = decide(&p, &tally, Some(4.0), &strict, before());
        let unknown = decide(&p, &tally, None, &strict, before());
        assert!(unknown.degraded);
        assert_eq!(known.participation, 0.25);
        assert_eq!(unknown.participation, 0.25);
        assert!(!unknown.quorum_met);
        assert_eq!(unknown.verdict, known.verdict);
        assert_eq!(unknown.verdict, Verdict::Pending);

        let lenient = decide(&p, &tally, None, &TallyPolicy::default(), before());
        assert_eq!(lenient.participation, 1.0);
        assert_eq!(lenient.verdict, Verdict::Approved);
    }

    #[test]
    fn pending_expired_only_when_quorum_missed() {
        let policy = TallyPolicy {
            expiry: ExpiryPolicy::MarkPendingExpired,
            ..TallyPolicy::default()
        };
        let p = proposal(GovernanceModel::Majority, 0.5, 0.5);

        let thin = tally_of(&[(VoteType::Approve, 1.0)]);
        assert_eq!(
            decide(&p, &thin, Some(10.0), &policy, after()).verdict,
            Verdict::PendingExpired
        );

        let failed = tally_of(&[(VoteType::Reject, 6.0), (VoteType::Approve, 1.0)]);
        assert_eq!(
            decide(&p, &failed, Some(10.0), &policy, after()).verdict,
            Verdict::Rejected
        );
    }

    #[test]
    fn verdicts_map_onto_statuses() {
        assert_eq!(Verdict::Pending.settled_status(), None);
        assert_eq!(
            Verdict::Approved.settled_status(),
            Some(ProposalStatus::Approved)
        );
        assert_eq!(
            Verdict::from_terminal(ProposalStatus::Rejected),
            Some(Verdict::Rejected)
        );
        assert_eq!(Verdict::from_terminal(ProposalStatus::Voting), None);
    }
}
