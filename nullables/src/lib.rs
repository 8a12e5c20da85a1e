//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the governance engine (clock, storage,
//! stakeholder registry) are abstracted behind traits. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod registry;
pub mod store;

pub use clock::NullClock;
pub use registry::NullRegistry;
pub use store::NullGovernanceStore;
