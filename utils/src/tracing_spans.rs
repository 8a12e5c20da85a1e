//! Pre-built [`tracing::Span`] constructors for governance operations.
//!
//! Using consistent span names and field sets across the codebase makes it
//! easy to filter and correlate logs for a single proposal.

use tracing::{info_span, Span};

/// Span covering the creation of a proposal.
pub fn create_proposal_span(proposal: &str) -> Span {
    info_span!("create_proposal", proposal = %proposal)
}

/// Span covering a single vote submission.
pub fn cast_vote_span(proposal: &str, voter: &str) -> Span {
    info_span!("cast_vote", proposal = %proposal, voter = %voter)
}

/// Span covering a results query, including any lifecycle transition it triggers.
pub fn results_span(proposal: &str) -> Span {
    info_span!("results", proposal = %proposal)
}

/// Span covering a sweep over expired proposals.
pub fn sweep_span() -> Span {
    info_span!("finalize_expired")
}
