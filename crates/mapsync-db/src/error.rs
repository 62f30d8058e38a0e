//! Error types for the marker store.

use thiserror::Error;

/// Errors that can occur in the marker store.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Seed data could not be parsed.
    #[error("Seed error: {0}")]
    Seed(String),

    /// The request itself was rejected (missing record, bad patch, bad coordinates).
    #[error(transparent)]
    Rejected(#[from] mapsync_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<ron::error::SpannedError> for Error {
    fn from(err: ron::error::SpannedError) -> Self {
        Error::Seed(err.to_string())
    }
}

impl From<Error> for mapsync_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Rejected(err) => err,
            other => mapsync_core::Error::Store(other.to_string()),
        }
    }
}
