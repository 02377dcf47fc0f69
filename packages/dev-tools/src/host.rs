//! Coordinator wiring for the host binaries

use crate::config::HostConfig;
use semantic_bridge_core::compute::{ProcessComputeContext, StatusPush};
use semantic_bridge_core::store::JsonFileStatusStore;
use semantic_bridge_core::ModelLifecycleCoordinator;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Worker status pushes buffered ahead of the store
const STATUS_QUEUE_SIZE: usize = 32;

pub struct BridgeHost {
    pub coordinator: Arc<ModelLifecycleCoordinator>,
    pub context: Arc<ProcessComputeContext>,
    status_task: JoinHandle<()>,
}

impl BridgeHost {
    /// Build the coordinator; the worker is not started until first use
    pub fn build(config: &HostConfig) -> anyhow::Result<Self> {
        config
            .coordinator
            .validate()
            .map_err(|e| anyhow::anyhow!(e))?;

        let store = Arc::new(JsonFileStatusStore::new(&config.state_path));
        let (status_tx, status_rx) = mpsc::channel(STATUS_QUEUE_SIZE);
        let context = Arc::new(
            ProcessComputeContext::new(&config.worker_bin)
                .with_args(config.worker_args.iter().cloned())
                .with_status_sender(status_tx),
        );

        let coordinator = Arc::new(ModelLifecycleCoordinator::new(
            store,
            context.clone(),
            context.clone(),
            config.coordinator.clone(),
        ));

        let status_task = tokio::spawn(forward_status(Arc::clone(&coordinator), status_rx));

        info!(
            "Bridge host ready (state: {}, worker: {})",
            config.state_path.display(),
            config.worker_bin.display()
        );

        Ok(Self {
            coordinator,
            context,
            status_task,
        })
    }

    /// Load the preferred model in the background
    pub fn start_default_engine(&self) -> JoinHandle<()> {
        let coordinator = Arc::clone(&self.coordinator);
        tokio::spawn(async move { coordinator.initialize_default_engine().await })
    }

    /// Stop the worker and the status forwarder
    pub async fn shutdown(self) {
        self.context.shutdown().await;
        self.status_task.abort();
    }
}

/// Apply worker status pushes to the store in arrival order
///
/// Each push is acknowledged only after it has been written, which holds back
/// the worker's reply so the coordinator's final status lands last.
async fn forward_status(
    coordinator: Arc<ModelLifecycleCoordinator>,
    mut rx: mpsc::Receiver<StatusPush>,
) {
    while let Some(push) = rx.recv().await {
        if let Err(e) = coordinator.apply_external_status(push.state.clone()).await {
            warn!("Dropped compute context status push: {}", e);
        }
        push.ack();
    }
}
