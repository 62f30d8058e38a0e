//! Error types for mapsync-core

use thiserror::Error;

/// Core error type
///
/// Cloneable so a single stream failure can be delivered to every subscriber.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Definition not found: {kind}/{id}")]
    DefinitionNotFound { kind: String, id: String },

    #[error("Marker not found: {0}")]
    MarkerNotFound(String),

    #[error("Invalid coordinates: ({lat}, {lng})")]
    InvalidCoords { lat: f64, lng: f64 },

    #[error("Invalid patch field `{field}`: {reason}")]
    InvalidPatch { field: String, reason: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl Error {
    /// Shorthand for a patch field that carries the wrong value type
    pub fn invalid_patch(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPatch {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
