//! Error types for mapsync-engine

use thiserror::Error;

/// Result type for mapsync-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mapsync-engine
#[derive(Debug, Error)]
pub enum Error {
    /// The coordinator was started twice without stopping
    #[error("sync coordinator is already running")]
    AlreadyRunning,

    /// A write was attempted with no backend attached
    #[error("sync coordinator is not running")]
    NotRunning,

    /// Configuration could not be parsed
    #[error("config error: {0}")]
    Config(String),

    /// Core or backend error
    #[error("core error: {0}")]
    Core(#[from] mapsync_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ron::error::SpannedError> for Error {
    fn from(err: ron::error::SpannedError) -> Self {
        Error::Config(err.to_string())
    }
}

// Compile-time check that Error is Send + Sync for thread-safe error propagation.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
