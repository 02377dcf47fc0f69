//! Semantic Bridge compute worker
//!
//! Spawned by the orchestrator. stdin/stdout carry the JSON-lines protocol;
//! logs go to stderr.
//!
//! # Configuration
//!
//! - `BRIDGE_MODELS_DIR` - model root (default `~/.semantic-bridge/models`)
//! - `BRIDGE_PROGRESS_STEPS` - `downloading` pushes per load (default 4)
//! - `RUST_LOG` - log filter

use semantic_bridge_worker::{run_worker, ModelLoader, WorkerConfig};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("semantic_bridge_worker=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = WorkerConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let loader = ModelLoader::new(config)?;

    let stdin = BufReader::new(tokio::io::stdin());
    run_worker(loader, stdin, tokio::io::stdout()).await
}
