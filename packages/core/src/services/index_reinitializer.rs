//! Dependent Index Reinitialization
//!
//! The content index keeps vectors sized to the active model's embedding
//! dimension. It must be rebuilt when, and only when, a model switch changes
//! that dimension.

use async_trait::async_trait;

/// Subsystem whose storage is keyed to embedding dimension
#[async_trait]
pub trait IndexReinitializer: Send + Sync {
    /// Drop and rebuild dimension-dependent storage
    async fn reinitialize(&self) -> anyhow::Result<()>;
}
