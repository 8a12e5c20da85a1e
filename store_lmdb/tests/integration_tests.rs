//! Integration tests running the governance engine on the LMDB backend:
//! create proposal → cast votes → reopen environment → results.

use std::sync::Arc;

use coopgov_governance::{Ballot, GovernanceEngine, NewProposal, TallyPolicy, Verdict};
use coopgov_nullables::{NullClock, NullRegistry};
use coopgov_store::NoRegistry;
use coopgov_store_lmdb::LmdbEnvironment;
use coopgov_types::{GovernanceModel, ProposalMetadata, ProposalStatus, Timestamp, VoteType};

const MAP_SIZE: usize = 16 * 1024 * 1024;

fn new_proposal(deadline: u64) -> NewProposal {
    NewProposal {
        governance_model: GovernanceModel::Majority,
        quorum_threshold: 0.5,
        approval_threshold: 0.5,
        voting_deadline: Timestamp::new(deadline),
        metadata: ProposalMetadata {
            title: "Solar co-op roof lease".into(),
            ..ProposalMetadata::default()
        },
    }
}

#[test]
fn votes_and_status_survive_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let clock = Arc::new(NullClock::new(100));
    let registry = Arc::new(NullRegistry::with_default(4.0));

    let id = {
        let env = LmdbEnvironment::open(dir.path(), 8, MAP_SIZE).expect("open env");
        let engine = GovernanceEngine::new(
            env.governance_store(),
            Arc::clone(&registry),
            Arc::clone(&clock),
            TallyPolicy::default(),
        );
        let id = engine.create_proposal(new_proposal(1_000)).unwrap();
        engine.cast_vote(Ballot::new(id, "a", VoteType::Reject)).unwrap();
        engine.cast_vote(Ballot::new(id, "a", VoteType::Approve)).unwrap();
        engine.cast_vote(Ballot::delegate(id, "b", "a")).unwrap();
        id
    };

    let env = LmdbEnvironment::open(dir.path(), 8, MAP_SIZE).expect("reopen env");
    let engine = GovernanceEngine::new(
        env.governance_store(),
        Arc::clone(&registry),
        Arc::clone(&clock),
        TallyPolicy::default(),
    );

    // One record per voter.
    assert_eq!(engine.list_votes(&id).unwrap().len(), 2);

    let results = engine.get_results(&id).unwrap();
    assert_eq!(results.approve_weight, 2.0);
    assert_eq!(results.participation, 0.5);
    assert_eq!(results.verdict, Verdict::Approved);
    assert_eq!(
        engine.get_proposal(&id).unwrap().status,
        ProposalStatus::Approved
    );
}

#[test]
fn revote_after_reopen_keeps_sequence_moving() {
    let dir = tempfile::tempdir().expect("temp dir");
    let clock = Arc::new(NullClock::new(100));

    let id = {
        let env = LmdbEnvironment::open(dir.path(), 8, MAP_SIZE).expect("open env");
        let engine = GovernanceEngine::new(
            env.governance_store(),
            NoRegistry,
            Arc::clone(&clock),
            TallyPolicy::default(),
        );
        let id = engine.create_proposal(new_proposal(1_000)).unwrap();
        engine.cast_vote(Ballot::new(id, "a", VoteType::Approve)).unwrap();
        id
    };

    let env = LmdbEnvironment::open(dir.path(), 8, MAP_SIZE).expect("reopen env");
    let engine = GovernanceEngine::new(
        env.governance_store(),
        NoRegistry,
        Arc::clone(&clock),
        TallyPolicy::default(),
    );
    engine.cast_vote(Ballot::new(id, "a", VoteType::Reject)).unwrap();

    let votes = engine.list_votes(&id).unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].vote_type, VoteType::Reject);
    assert_eq!(votes[0].sequence, 2);
}

#[test]
fn sweep_settles_stored_proposals() {
    let dir = tempfile::tempdir().expect("temp dir");
    let clock = Arc::new(NullClock::new(100));
    let env = LmdbEnvironment::open(dir.path(), 8, MAP_SIZE).expect("open env");
    let engine = GovernanceEngine::new(
        env.governance_store(),
        NoRegistry,
        Arc::clone(&clock),
        TallyPolicy::default(),
    );

    let id = engine.create_proposal(new_proposal(200)).unwrap();
    engine.cast_vote(Ballot::new(id, "a", VoteType::Reject)).unwrap();
    clock.set(200);

    assert_eq!(
        engine.finalize_expired().unwrap(),
        vec![(id, ProposalStatus::Rejected)]
    );
}
