use thiserror::Error;

/// Failures reported by a storage backend or the stakeholder registry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("record already exists: {0}")]
    Duplicate(String),

    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("cannot encode or decode record: {0}")]
    Serialization(String),

    #[error("stored data is inconsistent: {0}")]
    Corruption(String),
}
