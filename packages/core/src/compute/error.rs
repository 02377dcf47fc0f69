//! Compute Context Error Types

use thiserror::Error;

/// The compute context could not be made ready
///
/// This is an environment problem (missing worker binary, spawn failure),
/// not a model problem, and is always reported with error type `unknown`.
#[derive(Error, Debug)]
pub enum ContextError {
    /// Worker process could not be started
    #[error("Failed to start compute context: {0}")]
    SpawnFailed(String),

    /// Worker started but cannot accept requests
    #[error("Compute context not ready: {0}")]
    NotReady(String),
}

impl ContextError {
    pub fn spawn_failed(msg: impl Into<String>) -> Self {
        Self::SpawnFailed(msg.into())
    }

    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }
}

/// The request/reply round trip did not produce a usable reply
///
/// Display text is fed to the error classifier, so variants that stem from
/// transport problems carry network vocabulary ("timeout", "connection").
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No reply arrived within the configured bound
    #[error("Compute context reply timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The compute context went away before replying
    #[error("Compute context connection closed before reply")]
    Closed,

    /// The request could not be written
    #[error("Failed to send request to compute context: {0}")]
    SendFailed(String),

    /// A reply arrived but could not be understood
    #[error("Malformed reply from compute context: {0}")]
    Malformed(String),

    /// The compute context replied `success: false`; carries its message verbatim
    #[error("{0}")]
    Rejected(String),
}

impl ChannelError {
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    pub fn send_failed(msg: impl Into<String>) -> Self {
        Self::SendFailed(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}
