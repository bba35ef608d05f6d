//! Error types for shiftlog-core

use thiserror::Error;

/// Result type alias using shiftlog-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shiftlog-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected input to a mutating operation; never partially applied
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Event store error outside the driver (corrupt row, failed conversion)
    #[error("Store error: {0}")]
    Store(String),

    /// Notification delivery failure; logged by callers, never escalated
    /// past the mutation it describes
    #[error("Notification sink error: {0}")]
    Sink(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether a retry with backoff may succeed.
    ///
    /// Driver and store failures are treated as transient; validation
    /// outcomes and missing records are final.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::LibSql(_) | Self::Store(_) | Self::Io(_))
    }

    /// Whether this is a uniqueness-constraint rejection.
    ///
    /// Used by writers whose duplicates are enforced by the schema (one
    /// pending request per target, one synthetic close per instant) to
    /// tell "lost a benign race" apart from a real store fault.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::LibSql(error) if error.to_string().contains("UNIQUE constraint failed"))
    }
}
