//! Error types for fp-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// The backend could not be opened (D001)
    #[error("[D001] Could not open database: {0}")]
    ConnectionError(String),

    /// A statement was rejected or failed while running (D002)
    #[error("[D002] Statement failed: {0}")]
    ExecutionError(String),

    /// The relation to profile does not exist (D003)
    #[error("[D003] Relation not found: {0}")]
    TableNotFound(String),

    /// The backend has no implementation for an operation (D004)
    #[error("[D004] {backend} backend does not support {feature}")]
    NotImplemented { backend: String, feature: String },

    /// A previous holder of the connection panicked (D005)
    #[error("[D005] Connection lock poisoned: {0}")]
    MutexPoisoned(String),

    /// Query returned an unexpected shape (D006)
    #[error("[D006] Unexpected query result: {0}")]
    UnexpectedResult(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Append the statement that raised this error to its message.
    pub(crate) fn in_statement(self, sql: &str) -> Self {
        match self {
            DbError::ExecutionError(msg) => DbError::ExecutionError(format!("{msg}: {sql}")),
            DbError::TableNotFound(msg) => DbError::TableNotFound(format!("{msg}: {sql}")),
            other => other,
        }
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured variants, so the message
        // is the only thing to classify on.
        let msg = err.to_string();
        if msg.contains("Table with name")
            || msg.contains("View with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
