use coopgov_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database schema version {found} is not supported (expected {expected})")]
    SchemaMismatch { found: u32, expected: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(what) => StoreError::NotFound(what),
            LmdbError::Duplicate(what) => StoreError::Duplicate(what),
            LmdbError::Serialization(msg) => StoreError::Serialization(msg),
            LmdbError::SchemaMismatch { .. } => StoreError::Corruption(e.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}
