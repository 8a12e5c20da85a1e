//! Abstract storage traits for the governance engine.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The engine depends only on the traits and never on a storage format.

pub mod error;
pub mod proposal;
pub mod registry;
pub mod vote;

pub use error::StoreError;
pub use proposal::ProposalStore;
pub use registry::{NoRegistry, StakeholderRegistry};
pub use vote::{VoteStore, VoteWrite};
