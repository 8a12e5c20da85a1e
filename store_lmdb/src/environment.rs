//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::schema;
use crate::LmdbError;

/// Number of named databases the governance schema uses.
pub const GOVERNANCE_DATABASES: u32 = 3;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    path: PathBuf,
    proposals_db: Database<Bytes, Bytes>,
    votes_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// Creates the directory and every database on first use, then checks
    /// the stored schema version.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path by this process and
        // the memory map is never modified outside heed transactions.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(GOVERNANCE_DATABASES))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let proposals_db = env.create_database(&mut wtxn, Some("proposals"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        schema::ensure_current(&mut wtxn, &meta_db)?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
            proposals_db,
            votes_db,
            meta_db,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Stored schema version.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        schema::read_version(&rtxn, &self.meta_db)
    }

    /// A store handle sharing this environment.
    pub fn governance_store(&self) -> LmdbGovernanceStore {
        LmdbGovernanceStore {
            env: Arc::clone(&self.env),
            proposals_db: self.proposals_db,
            votes_db: self.votes_db,
        }
    }
}

/// LMDB implementation of the proposal and vote stores.
///
/// Proposals are keyed by their 16 id bytes. Votes are keyed by
/// `proposal_id_bytes ++ voter_id_bytes`, so one record is kept per voter
/// and a prefix scan returns a proposal's votes.
#[derive(Clone)]
pub struct LmdbGovernanceStore {
    pub(crate) env: Arc<Env>,
    pub(crate) proposals_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
}
