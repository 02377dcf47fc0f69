/// Semantic Bridge Compute Worker - Isolated Model Preparation
///
/// The compute context the orchestrator talks to. It runs as its own OS
/// process, reads `SIMILARITY_ENGINE_INIT` requests as JSON lines on stdin and
/// answers each with `{"replyTo": id, "success": bool, "error"?: string}` on
/// stdout, pushing `UPDATE_MODEL_STATUS` records while it works.
///
/// # Features
///
/// - **Registry Checks**: Rejects requests whose dimension disagrees with the preset
/// - **Local Model Store**: Resolves weights under `~/.semantic-bridge/models/<preset>/`
/// - **Progress Pushes**: Emits `downloading` ticks, then `initializing`
/// - **Sticky Loads**: A repeat request for the loaded variant succeeds immediately
///
/// # Example
///
/// ```ignore
/// use semantic_bridge_worker::{run_worker, ModelLoader, WorkerConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let loader = ModelLoader::new(WorkerConfig::default())?;
///     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
///     run_worker(loader, stdin, tokio::io::stdout()).await
/// }
/// ```
pub mod config;
pub mod error;
pub mod loader;
pub mod worker;

// Re-export main types
pub use config::WorkerConfig;
pub use error::{Result, WorkerError};
pub use loader::ModelLoader;
pub use worker::run_worker;
