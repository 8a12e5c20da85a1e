//! LMDB storage backend for the cooperative governance engine.
//!
//! Implements the storage traits from `coopgov-store` using the `heed` LMDB
//! bindings. Proposals and votes each live in their own database within a
//! single environment; records are bincode-encoded.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod proposal;
pub mod schema;
pub mod vote;

pub use environment::{LmdbEnvironment, LmdbGovernanceStore};
pub use error::LmdbError;
