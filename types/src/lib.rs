//! Fundamental types for the cooperative governance engine.
//!
//! This crate defines the records shared across every other crate in the workspace:
//! proposal and voter identifiers, timestamps and the clock abstraction, and the
//! persisted proposal and vote records.

pub mod error;
pub mod id;
pub mod proposal;
pub mod time;
pub mod vote;

pub use error::TypeError;
pub use id::{ProposalId, VoterId};
pub use proposal::{GovernanceModel, Proposal, ProposalMetadata, ProposalStatus};
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::{Vote, VoteType};
