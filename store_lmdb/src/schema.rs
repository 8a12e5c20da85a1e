//! Schema version tracking.
//!
//! The version lives in the `meta` database as four little-endian bytes.
//! A fresh environment is stamped with the current version; an environment
//! written by a newer build is refused.

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};

use crate::LmdbError;

/// The schema version the current code reads and writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Stored version, 0 for an environment that was never stamped.
pub fn read_version(rtxn: &RoTxn<'_>, meta_db: &Database<Bytes, Bytes>) -> Result<u32, LmdbError> {
    match meta_db.get(rtxn, SCHEMA_VERSION_KEY)? {
        None => Ok(0),
        Some(bytes) => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                LmdbError::Serialization(format!(
                    "schema version has {} bytes, expected 4",
                    bytes.len()
                ))
            })?;
            Ok(u32::from_le_bytes(arr))
        }
    }
}

/// Stamp a fresh environment or verify an existing one.
pub fn ensure_current(
    wtxn: &mut RwTxn<'_>,
    meta_db: &Database<Bytes, Bytes>,
) -> Result<(), LmdbError> {
    let found = read_version(wtxn, meta_db)?;
    match found {
        0 => {
            meta_db.put(wtxn, SCHEMA_VERSION_KEY, &CURRENT_SCHEMA_VERSION.to_le_bytes())?;
            tracing::info!(version = CURRENT_SCHEMA_VERSION, "stamped new database schema");
            Ok(())
        }
        CURRENT_SCHEMA_VERSION => {
            tracing::debug!(version = found, "database schema is up to date");
            Ok(())
        }
        _ => Err(LmdbError::SchemaMismatch {
            found,
            expected: CURRENT_SCHEMA_VERSION,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heed::EnvOpenOptions;

    fn temp_env() -> (tempfile::TempDir, heed::Env, Database<Bytes, Bytes>) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(1024 * 1024)
                .max_dbs(1)
                .open(dir.path())
                .expect("open env")
        };
        let mut wtxn = env.write_txn().unwrap();
        let db = env.create_database(&mut wtxn, Some("meta")).unwrap();
        wtxn.commit().unwrap();
        (dir, env, db)
    }

    #[test]
    fn fresh_environment_is_stamped() {
        let (_dir, env, db) = temp_env();
        let mut wtxn = env.write_txn().unwrap();
        ensure_current(&mut wtxn, &db).unwrap();
        wtxn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert_eq!(read_version(&rtxn, &db).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_refused() {
        let (_dir, env, db) = temp_env();
        let mut wtxn = env.write_txn().unwrap();
        db.put(&mut wtxn, SCHEMA_VERSION_KEY, &99u32.to_le_bytes())
            .unwrap();
        let err = ensure_current(&mut wtxn, &db).unwrap_err();
        assert!(matches!(
            err,
            LmdbError::SchemaMismatch {
                found: 99,
                expected: CURRENT_SCHEMA_VERSION
            }
        ));
    }

    #[test]
    fn malformed_version_is_a_serialization_error() {
        let (_dir, env, db) = temp_env();
        let mut wtxn = env.write_txn().unwrap();
        db.put(&mut wtxn, SCHEMA_VERSION_KEY, b"v1").unwrap();
        assert!(matches!(
            read_version(&wtxn, &db),
            Err(LmdbError::Serialization(_))
        ));
    }
}
