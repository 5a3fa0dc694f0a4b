use thiserror::Error;

/// Errors from the paginated source store.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request did not complete within the configured deadline.
    #[error("source request timed out: {0}")]
    Timeout(String),

    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("source request failed: {0}")]
    Http(String),

    /// The store answered with a non-success status.
    #[error("source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON array of objects.
    #[error("failed to decode source response: {0}")]
    Decode(String),
}

impl SourceError {
    /// Timeout-class errors are the only ones the extractor retries.
    pub fn is_timeout(&self) -> bool {
        match self {
            SourceError::Timeout(_) => true,
            // Gateways in front of the source report an exhausted statement
            // deadline as 504 or 408 rather than dropping the socket.
            SourceError::Status { status, .. } => matches!(status, 408 | 504),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else {
            SourceError::Http(err.to_string())
        }
    }
}

/// Errors from the target database layer.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQL error: {0}")]
    Sql(#[from] tokio_postgres::Error),

    /// Writing rows failed at the application level.
    #[error("write error: {0}")]
    Write(String),

    /// A value could not be coerced to the column's wire type.
    #[error("type coercion error: {0}")]
    Coercion(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("failed to connect to target database: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("failed to build source client: {0}")]
    Rest(#[from] reqwest::Error),

    #[error("invalid connector configuration: {0}")]
    Config(String),
}
