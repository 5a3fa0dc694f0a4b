use connectors::error::{DbError, SourceError};
use thiserror::Error;

/// Extraction failed for one table; any accumulated rows are discarded.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("page {page} of '{table}' failed: {source}")]
    Page {
        table: String,
        page: usize,
        #[source]
        source: SourceError,
    },

    #[error("page {page} of '{table}' failed again at reduced size {retry_size}: {source}")]
    RetryExhausted {
        table: String,
        page: usize,
        retry_size: usize,
        #[source]
        source: SourceError,
    },
}

/// A table-level write failure in transactional mode.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("batch {batch} of '{table}' failed, rolling back table: {source}")]
    Batch {
        table: String,
        batch: usize,
        #[source]
        source: DbError,
    },

    #[error("transaction control failed for '{table}': {source}")]
    Transaction {
        table: String,
        #[source]
        source: DbError,
    },
}

/// Top-level engine failures surfaced past the orchestrator boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Either store failed its liveness probe; the whole run is aborted
    /// before any table is touched.
    #[error("connectivity check failed: {0}")]
    Connectivity(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
