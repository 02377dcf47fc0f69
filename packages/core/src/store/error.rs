//! Status Store Error Types

use thiserror::Error;

/// Errors raised by status store backends
///
/// `Unavailable` means the persistence layer cannot be reached at all (no
/// storage access in a sandboxed or early-startup environment). Status
/// queries absorb it and report defaults instead of failing.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Storage backend is not accessible
    #[error("Status storage unavailable: {0}")]
    Unavailable(String),

    /// Underlying I/O failure
    #[error("Status storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be encoded or decoded
    #[error("Status storage serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Whether the error means storage is absent rather than broken
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
