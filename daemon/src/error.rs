use coopgov_governance::GovernanceError;
use coopgov_store_lmdb::LmdbError;
use coopgov_utils::LoggingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] LmdbError),

    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
