use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TableError>;

#[derive(Debug, Error)]
pub enum TableError {
    /// Bad schema, bad record, bad predicate list or unknown column.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted table text that cannot be turned into records.
    #[error("malformed table file at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

impl TableError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        TableError::Validation(message.into())
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        TableError::Malformed {
            line,
            reason: reason.into(),
        }
    }
}
