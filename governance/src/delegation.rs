//! Vote delegation: follow a voter's chain to the decision that carries their weight.
//!
//! Supports:
//! - **Transitive delegation** (A→B→C means A's weight follows C's vote)
//! - **Last-write-wins** collapsing of a voter's superseded votes
//! - **Cycle detection** and an optional max-depth limit
//!
//! Resolution is a pure function of the vote snapshot it was built from.
//! A delegator's weight is never moved onto the delegate's own weight; it is
//! counted on whichever side the terminal vote of the chain is on.

use coopgov_types::{Vote, VoteType, VoterId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A terminal decision that weight can be counted under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Approve,
    Reject,
    Abstain,
    Object,
}

impl Stance {
    /// The stance a vote type stands for, `None` for delegation.
    pub fn from_vote_type(vote_type: VoteType) -> Option<Self> {
        match vote_type {
            VoteType::Approve => Some(Self::Approve),
            VoteType::Reject => Some(Self::Reject),
            VoteType::Abstain => Some(Self::Abstain),
            VoteType::Object => Some(Self::Object),
            VoteType::Delegate => None,
        }
    }
}

/// Why a delegation could not be followed to a countable decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// The chain returned to a voter already on it.
    Cycle,
    /// The chain points at a voter with no vote on this proposal.
    MissingDelegate,
    /// The chain ends at an objection, which carries no transferable weight.
    DelegatedToObjection,
    /// The chain is longer than the configured maximum depth.
    DepthExceeded,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cycle => "delegation cycle",
            Self::MissingDelegate => "delegate has not voted",
            Self::DelegatedToObjection => "delegated to an objection",
            Self::DepthExceeded => "delegation chain too deep",
        };
        f.write_str(s)
    }
}

/// How a voter's weight ended up being treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Counted(Stance),
    Unresolved(UnresolvedReason),
}

/// A voter's vote after delegation resolution. Derived, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectiveVote {
    pub voter: VoterId,
    /// The voter's own weight.
    pub weight: f64,
    pub outcome: Outcome,
    /// Voters visited, starting with `voter` itself. For a cycle the
    /// revisited voter is repeated at the end.
    pub chain: Vec<VoterId>,
}

impl EffectiveVote {
    pub fn stance(&self) -> Option<Stance> {
        match self.outcome {
            Outcome::Counted(stance) => Some(stance),
            Outcome::Unresolved(_) => None,
        }
    }

    /// The diagnostic record for an unresolved vote.
    pub fn unresolved(&self) -> Option<UnresolvedDelegation> {
        match self.outcome {
            Outcome::Unresolved(reason) => Some(UnresolvedDelegation {
                voter: self.voter.clone(),
                weight: self.weight,
                reason,
                chain: self.chain.clone(),
            }),
            Outcome::Counted(_) => None,
        }
    }
}

/// Non-fatal diagnostic for weight excluded from the tally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedDelegation {
    pub voter: VoterId,
    pub weight: f64,
    pub reason: UnresolvedReason,
    pub chain: Vec<VoterId>,
}

impl fmt::Display for UnresolvedDelegation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain: Vec<&str> = self.chain.iter().map(VoterId::as_str).collect();
        write!(
            f,
            "unresolved_delegation {} (weight {}): {} [{}]",
            self.voter,
            self.weight,
            self.reason,
            chain.join(" -> ")
        )
    }
}

/// Resolves effective votes over one snapshot of a proposal's votes.
pub struct DelegationResolver<'a> {
    /// Active vote per voter, ordered by voter id for deterministic output.
    active: BTreeMap<&'a VoterId, &'a Vote>,
    /// Maximum number of delegation hops; unlimited if `None`.
    max_depth: Option<usize>,
}

impl<'a> DelegationResolver<'a> {
    /// Build a resolver, keeping only each voter's latest vote.
    pub fn new(votes: &'a [Vote], max_depth: Option<usize>) -> Self {
        let mut active: BTreeMap<&'a VoterId, &'a Vote> = BTreeMap::new();
        for vote in votes {
            let newer = active
                .get(&vote.voter_id)
                .map_or(true, |existing| vote.supersedes(existing));
            if newer {
                active.insert(&vote.voter_id, vote);
            }
        }
        Self { active, max_depth }
    }

    /// The vote currently in force for a voter.
    pub fn active_vote(&self, voter: &VoterId) -> Option<&'a Vote> {
        self.active.get(voter).copied()
    }

    /// Number of voters with an active vote.
    pub fn voter_count(&self) -> usize {
        self.active.len()
    }

    /// Resolve one voter's effective vote, `None` if they have not voted.
    pub fn resolve(&self, voter: &VoterId) -> Option<EffectiveVote> {
        let own = self.active_vote(voter)?;
        let mut chain = vec![own.voter_id.clone()];
        let mut visited: HashSet<&VoterId> = HashSet::new();
        visited.insert(&own.voter_id);

        let mut current = own;
        let mut hops = 0usize;
        let outcome = loop {
            if let Some(stance) = Stance::from_vote_type(current.vote_type) {
                if hops > 0 && stance == Stance::Object {
                    break Outcome::Unresolved(UnresolvedReason::DelegatedToObjection);
                }
                break Outcome::Counted(stance);
            }

            let Some(target) = current.delegate_to.as_ref() else {
                break Outcome::Unresolved(UnresolvedReason::MissingDelegate);
            };
            chain.push(target.clone());
            if !visited.insert(target) {
                break Outcome::Unresolved(UnresolvedReason::Cycle);
            }
            hops += 1;
            if self.max_depth.is_some_and(|max| hops > max) {
                break Outcome::Unresolved(UnresolvedReason::DepthExceeded);
            }
            match self.active_vote(target) {
                Some(next) => current = next,
                None => break Outcome::Unresolved(UnresolvedReason::MissingDelegate),
            }
        };

        Some(EffectiveVote {
            voter: own.voter_id.clone(),
            weight: own.weight,
            outcome,
            chain,
        })
    }

    /// Resolve every active voter, ordered by voter id.
    pub fn resolve_all(&self) -> Vec<EffectiveVote> {
        self.active
            .keys()
            .filter_map(|voter| self.resolve(voter))
            .collect()
    }
}
