//! Proposal and vote tallying for cooperative governance.
//!
//! A proposal opens for voting until its deadline. Stakeholders approve,
//! reject, abstain, object, or delegate their weight to another voter.
//! Results resolve delegation chains, sum weight per decision, and check
//! participation against the quorum threshold and the approval ratio against
//! the governance model's requirement.
//!
//! Lifecycle: `voting` → `approved` | `rejected` | `pending_expired`.
//! A proposal leaves `voting` once and never returns.

pub mod decision;
pub mod delegation;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod tally;

pub use decision::{decide, Decision, Verdict, SUPERMAJORITY_FLOOR};
pub use delegation::{
    DelegationResolver, EffectiveVote, Outcome, Stance, UnresolvedDelegation, UnresolvedReason,
};
pub use engine::{Ballot, GovernanceEngine, NewProposal, ProposalResults};
pub use error::GovernanceError;
pub use policy::{ExpiryPolicy, TallyPolicy};
pub use tally::Tally;
