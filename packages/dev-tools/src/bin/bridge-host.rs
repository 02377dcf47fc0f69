//! Semantic Bridge stdio host
//!
//! Serves control messages as JSON lines on stdin/stdout, persisting status to
//! a JSON state file and running the model in a spawned compute worker.
//!
//! Architecture:
//!   Client → stdin (JSON lines) → ModelLifecycleCoordinator → worker stdin
//!   Client ← stdout (replies)   ←            ↓               ← worker stdout (replies, status pushes)
//!                                   ~/.semantic-bridge/state.json
//!
//! # Usage
//!
//! ```bash
//! cargo build --bin semantic-bridge-worker
//! BRIDGE_WORKER_BIN=target/debug/semantic-bridge-worker cargo run --bin bridge-host
//! {"type": "GET_MODEL_STATUS"}
//! ```
//!
//! stdout is reserved for replies; all diagnostics go to stderr.

use semantic_bridge_core::bridge::run_bridge_stdio;
use semantic_bridge_dev_tools::{BridgeHost, HostConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("bridge_host=debug,semantic_bridge_core=debug")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    eprintln!("🔧 Initializing bridge-host...");

    let config = match HostConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    let host = BridgeHost::build(&config)?;
    eprintln!("✅ Coordinator initialized");
    eprintln!("   State file: {}", config.state_path.display());
    eprintln!("   Worker: {}", config.worker_bin.display());

    // Best effort: failures are logged and the bridge keeps serving
    host.start_default_engine();

    let result = run_bridge_stdio(host.coordinator.clone()).await;
    host.shutdown().await;
    result
}
