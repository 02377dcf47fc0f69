//! Compute Context Collaborators
//!
//! The orchestrator never loads or runs the embedding model itself. It asks a
//! separate, isolated compute context to do so, across a process boundary:
//!
//! - `ComputeContextManager` - makes sure the compute context exists and can
//!   accept a request
//! - `MessageChannel` - one-shot request/reply transport to that context
//!
//! `ProcessComputeContext` implements both over a child process speaking
//! JSON lines on stdin/stdout.

mod error;
pub mod messages;
mod process;

pub use error::{ChannelError, ContextError};
pub use messages::{
    ComputeMessageType, ComputeReply, ComputeRequest, EngineInitConfig, StatusUpdate,
    WorkerMessage, COMPUTE_TARGET,
};
pub use process::{ProcessComputeContext, StatusPush};

use async_trait::async_trait;

/// Ensures the isolated compute context is running
#[async_trait]
pub trait ComputeContextManager: Send + Sync {
    /// Idempotent: returns immediately when the context is already up
    async fn ensure_ready(&self) -> Result<(), ContextError>;
}

/// Request/reply transport to the compute context
///
/// Each call produces at most one reply. Implementations do not retry and do
/// not time out on their own; callers bound the wait.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, request: ComputeRequest) -> Result<ComputeReply, ChannelError>;
}
