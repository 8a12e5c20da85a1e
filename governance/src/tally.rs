//! Tally calculator: weighted totals per terminal decision.

use coopgov_types::Vote;
use serde::{Deserialize, Serialize};

use crate::delegation::{DelegationResolver, EffectiveVote, Outcome, Stance, UnresolvedDelegation};
use crate::policy::TallyPolicy;

/// Weighted totals over a set of effective votes.
///
/// `total_cast_weight` is always exactly `approve + reject + abstain`;
/// objections and unresolved delegations are tracked beside it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub approve_weight: f64,
    pub reject_weight: f64,
    pub abstain_weight: f64,
    pub object_weight: f64,
    pub unresolved_weight: f64,
    pub total_cast_weight: f64,
    /// Voters whose weight was counted under some stance (objections included).
    pub counted_voters: usize,
    /// Counted voters whose stance is an objection.
    pub object_voters: usize,
    pub unresolved_voters: usize,
    /// One diagnostic per unresolved voter, ordered by voter id.
    pub unresolved: Vec<UnresolvedDelegation>,
}

impl Tally {
    /// Aggregate already-resolved votes.
    pub fn from_effective_votes(votes: &[EffectiveVote]) -> Self {
        let mut tally = Self::default();
        for vote in votes {
            match vote.outcome {
                Outcome::Counted(stance) => {
                    tally.counted_voters += 1;
                    match stance {
                        Stance::Approve => tally.approve_weight += vote.weight,
                        Stance::Reject => tally.reject_weight += vote.weight,
                        Stance::Abstain => tally.abstain_weight += vote.weight,
                        Stance::Object => {
                            tally.object_weight += vote.weight;
                            tally.object_voters += 1;
                        }
                    }
                }
                Outcome::Unresolved(_) => {
                    tally.unresolved_voters += 1;
                    tally.unresolved_weight += vote.weight;
                    tally.unresolved.extend(vote.unresolved());
                }
            }
        }
        tally.total_cast_weight = tally.approve_weight + tally.reject_weight + tally.abstain_weight;
        tally
    }

    /// Resolve a raw vote snapshot and aggregate it.
    pub fn from_votes(votes: &[Vote], policy: &TallyPolicy) -> Self {
        let resolver = DelegationResolver::new(votes, policy.max_delegation_depth);
        Self::from_effective_votes(&resolver.resolve_all())
    }

    /// Weight that counts toward quorum under `policy`.
    pub fn participating_weight(&self, policy: &TallyPolicy) -> f64 {
        let mut weight = self.total_cast_weight;
        if policy.objections_count_toward_quorum {
            weight += self.object_weight;
        }
        if policy.unresolved_counts_toward_participation {
            weight += self.unresolved_weight;
        }
        weight
    }

    /// Voters that count toward the degraded participation proxy under `policy`.
    pub fn participating_voters(&self, policy: &TallyPolicy) -> usize {
        let mut voters = self.counted_voters;
        if !policy.objections_count_toward_quorum {
            voters -= self.object_voters;
        }
        if policy.unresolved_counts_toward_participation {
            voters += self.unresolved_voters;
        }
        voters
    }

    /// Total voters with an active vote.
    pub fn voter_count(&self) -> usize {
        self.counted_voters + self.unresolved_voters
    }

    /// Share of cast weight that approves; 0 when nothing was cast.
    pub fn approval_ratio(&self) -> f64 {
        if self.total_cast_weight > 0.0 {
            self.approve_weight / self.total_cast_weight
        } else {
            0.0
        }
    }
}
