use thiserror::Error;

/// Coarse classification of a [`SqlStewardError`].
///
/// Every failure falls into exactly one of these buckets; none of them are retried by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No connection (or statement) could be obtained.
    Acquisition,
    /// An argument could not be placed at its position.
    Binding,
    /// The database rejected or could not run a statement.
    Execution,
    /// The API was driven in a way its protocol forbids (duplicate savepoint, closed handle, ...).
    Usage,
}

#[derive(Debug, Error)]
pub enum SqlStewardError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Cannot bind argument at position {position}: {source}")]
    ParameterError {
        position: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Batch operation {index} failed after {} completed: {source}", completed.len())]
    BatchError {
        /// Zero-based index of the failing operation in put order.
        index: usize,
        /// Affected-row counts of the operations that ran before the failure.
        completed: Vec<usize>,
        #[source]
        source: Box<SqlStewardError>,
    },

    #[error("Savepoint with name: {0} already exists")]
    SavepointExists(String),

    #[error("Savepoint with name: {0} not found")]
    SavepointNotFound(String),

    #[error("Transaction already closed")]
    TransactionClosed,

    #[error("Batch already closed")]
    BatchClosed,
}

impl SqlStewardError {
    /// Which failure bucket this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError(_) | Self::ConnectionError(_) => ErrorKind::Acquisition,
            Self::ParameterError { .. } => ErrorKind::Binding,
            Self::SqliteError(err) => match err {
                rusqlite::Error::InvalidParameterCount(_, _)
                | rusqlite::Error::InvalidParameterName(_)
                | rusqlite::Error::ToSqlConversionFailure(_) => ErrorKind::Binding,
                _ => ErrorKind::Execution,
            },
            Self::ExecutionError(_) | Self::BatchError { .. } => ErrorKind::Execution,
            Self::SavepointExists(_)
            | Self::SavepointNotFound(_)
            | Self::TransactionClosed
            | Self::BatchClosed => ErrorKind::Usage,
        }
    }
}

impl From<bb8::RunError<rusqlite::Error>> for SqlStewardError {
    fn from(err: bb8::RunError<rusqlite::Error>) -> Self {
        SqlStewardError::ConnectionError(format!("SQLite pool error: {err}"))
    }
}
