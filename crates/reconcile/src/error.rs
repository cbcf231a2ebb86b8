use thiserror::Error;

/// Failures of the external ledger query. Any of these aborts the
/// reconciliation request; partial output is never used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Ledger query failed: {0}")]
    Failed(String),
    #[error("Ledger query timed out")]
    Timeout,
    #[error("Ledger query output could not be read: {0}")]
    Unparseable(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read account mappings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid account mappings: {0}")]
    Json(#[from] serde_json::Error),
}
