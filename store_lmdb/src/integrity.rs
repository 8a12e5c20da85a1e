//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before any proposal is read.

use std::path::Path;

use coopgov_types::{Proposal, Vote};

use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub proposals: u64,
    pub votes: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Decode every stored record.
///
/// Records that fail to decode are listed in the report rather than causing
/// a hard error; only a failure to read the databases at all is fatal.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let store = env.governance_store();
    let rtxn = env.env().read_txn()?;
    let mut report = IntegrityReport::default();

    for entry in store.proposals_db.iter(&rtxn)? {
        let (key, bytes) = entry?;
        report.proposals += 1;
        if let Err(e) = bincode::deserialize::<Proposal>(bytes) {
            report
                .errors
                .push(format!("proposal record {:02x?} is unreadable: {}", key, e));
        }
    }

    for entry in store.votes_db.iter(&rtxn)? {
        let (key, bytes) = entry?;
        report.votes += 1;
        match bincode::deserialize::<Vote>(bytes) {
            Ok(vote) if key.get(..16) != Some(vote.proposal_id.as_bytes().as_slice()) => {
                report.errors.push(format!(
                    "vote by {} is filed under the wrong proposal",
                    vote.voter_id
                ));
            }
            Ok(_) => {}
            Err(e) => report
                .errors
                .push(format!("vote record {:02x?} is unreadable: {}", key, e)),
        }
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing, which suggests
/// misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coopgov_store::{ProposalStore, VoteStore};
    use coopgov_types::{
        GovernanceModel, ProposalId, ProposalMetadata, ProposalStatus, Timestamp, VoteType,
        VoterId,
    };

    #[test]
    fn missing_directory_is_a_fresh_start() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(check_data_dir(&dir.path().join("absent")).is_ok());
    }

    #[test]
    fn empty_directory_is_suspicious() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn populated_environment_is_healthy() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 8, 16 * 1024 * 1024).expect("open env");
        let store = env.governance_store();
        let id = ProposalId::from_bytes([7; 16]);
        store
            .put_proposal(&Proposal {
                id,
                governance_model: GovernanceModel::Majority,
                quorum_threshold: 0.5,
                approval_threshold: 0.5,
                voting_deadline: Timestamp::new(10),
                status: ProposalStatus::Voting,
                created_at: Timestamp::new(0),
                metadata: ProposalMetadata::default(),
            })
            .unwrap();
        store
            .append_or_replace_vote(&Vote {
                proposal_id: id,
                voter_id: VoterId::new("a"),
                vote_type: VoteType::Approve,
                weight: 1.0,
                delegate_to: None,
                cast_at: Timestamp::new(1),
                sequence: 1,
            })
            .unwrap();

        assert!(check_data_dir(dir.path()).is_ok());
        let report = check_integrity(&env).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.proposals, 1);
        assert_eq!(report.votes, 1);
    }

    #[test]
    fn unreadable_record_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 8, 16 * 1024 * 1024).expect("open env");
        let store = env.governance_store();
        let mut wtxn = env.env().write_txn().unwrap();
        store.proposals_db.put(&mut wtxn, &[1u8; 16], b"junk").unwrap();
        wtxn.commit().unwrap();

        let report = check_integrity(&env).unwrap();
        assert!(!report.is_healthy());
        assert_eq!(report.proposals, 1);
    }
}
