//! Model Lifecycle Coordinator
//!
//! Owns the embedding model lifecycle from the orchestrator's side:
//!
//! - tracks which configuration the compute context has confirmed loading
//! - decides whether a requested configuration needs a switch at all
//! - drives the switch through the compute context and records progress
//!   (`downloading(0) -> ready(100) | error(0)`) in the status store
//! - classifies failures and triggers an index rebuild when the embedding
//!   dimension changes
//!
//! ## Current configuration
//!
//! The in-memory current configuration is set only after the compute context
//! replies `success: true`. It is never inferred from the persisted
//! `ModelState`, which may be stale after a restart or mid-way through a
//! concurrent switch. A restart clears it, so the first request after a
//! restart always runs the switch protocol.
//!
//! ## Concurrency
//!
//! Overlapping `switch_model` calls are not serialized unless
//! `CoordinatorConfig::serialize_switches` is set. Without it both calls may
//! see "switch needed", both contact the compute context, and the status
//! record reflects whichever write lands last. A failed switch can never
//! overwrite the current configuration.

use crate::compute::{ChannelError, ComputeContextManager, ComputeRequest, MessageChannel};
use crate::config::CoordinatorConfig;
use crate::models::{ModelConfiguration, ModelState, StatusReport};
use crate::services::error::SwitchError;
use crate::services::error_classifier::classify;
use crate::services::index_reinitializer::IndexReinitializer;
use crate::store::{self, StatusStore, StoreError};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Message used when the compute context rejects a request without saying why
const DEFAULT_SWITCH_FAILURE: &str = "Failed to switch model";

/// Coordinates model initialization and switching across the process boundary
///
/// Construct one per process and share it behind an `Arc`.
pub struct ModelLifecycleCoordinator {
    store: Arc<dyn StatusStore>,
    context: Arc<dyn ComputeContextManager>,
    channel: Arc<dyn MessageChannel>,
    index: Option<Arc<dyn IndexReinitializer>>,
    config: CoordinatorConfig,
    current: RwLock<Option<ModelConfiguration>>,
    switch_lock: Mutex<()>,
}

impl ModelLifecycleCoordinator {
    /// Create a coordinator with nothing loaded
    ///
    /// `context` and `channel` are frequently the same object (for example a
    /// `ProcessComputeContext`), passed twice.
    pub fn new(
        store: Arc<dyn StatusStore>,
        context: Arc<dyn ComputeContextManager>,
        channel: Arc<dyn MessageChannel>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            context,
            channel,
            index: None,
            config,
            current: RwLock::new(None),
            switch_lock: Mutex::new(()),
        }
    }

    /// Attach the subsystem to rebuild when the embedding dimension changes
    pub fn with_index_reinitializer(mut self, index: Arc<dyn IndexReinitializer>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Configuration the compute context last confirmed loading, if any
    pub fn current_configuration(&self) -> Option<ModelConfiguration> {
        *self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_current_configuration(&self, config: ModelConfiguration) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(config);
    }

    /// Whether `requested` differs from what is loaded
    ///
    /// Always true when nothing has been loaded yet. Otherwise compares
    /// preset, version and dimension field by field.
    pub fn needs_switch(&self, requested: &ModelConfiguration) -> bool {
        match self.current_configuration() {
            None => true,
            Some(current) => {
                current.preset != requested.preset
                    || current.version != requested.version
                    || current.dimension != requested.dimension
            }
        }
    }

    /// Load the user's preferred model at startup
    ///
    /// Best effort: every failure is logged and swallowed so the host keeps
    /// running. Unlike `switch_model`, this path does not write `ModelState`.
    pub async fn initialize_default_engine(&self) {
        let preference = match store::load_selected_preference(self.store.as_ref()).await {
            Ok(preference) => preference,
            Err(e) => {
                error!("Failed to read selected model, default engine not initialized: {}", e);
                return;
            }
        };
        let requested = preference.to_configuration();

        if let Err(e) = self.context.ensure_ready().await {
            error!("Failed to initialize default semantic engine: {}", e);
            return;
        }

        match self.request_engine_init(&requested).await {
            Ok(()) => {
                self.set_current_configuration(requested);
                info!("Semantic engine initialized successfully: {}", requested);
            }
            Err(e) => {
                error!("Failed to initialize default semantic engine: {}", e);
            }
        }
    }

    /// Switch the compute context to `requested`
    ///
    /// `previous_dimension` is the dimension the dependent index was built
    /// for; when it differs from `requested.dimension` the index is rebuilt
    /// after a successful load. A rebuild failure is logged and does not fail
    /// the switch.
    ///
    /// # Errors
    ///
    /// - `SwitchError::ComputeContext` if the compute context cannot be started
    /// - `SwitchError::ModelLoad` if the compute context rejects the request,
    ///   the transport fails, or no reply arrives within the configured timeout
    ///
    /// Either way an `error` ModelState has been persisted before returning.
    pub async fn switch_model(
        &self,
        requested: ModelConfiguration,
        previous_dimension: Option<u32>,
    ) -> Result<(), SwitchError> {
        let _serialized = if self.config.serialize_switches {
            Some(self.switch_lock.lock().await)
        } else {
            None
        };

        if !self.needs_switch(&requested) {
            debug!("Model {} already loaded, confirming ready", requested);
            self.persist(ModelState::ready()).await;
            return Ok(());
        }

        info!("Switching embedding model to {}", requested);
        self.persist(ModelState::downloading(0)).await;

        if let Err(e) = self.context.ensure_ready().await {
            error!("Failed to prepare compute context: {}", e);
            let err = SwitchError::from(e);
            self.persist(ModelState::error(err.to_string(), err.error_type()))
                .await;
            return Err(err);
        }

        match self.request_engine_init(&requested).await {
            Ok(()) => {
                self.set_current_configuration(requested);

                if let Some(previous) = previous_dimension {
                    if previous != requested.dimension {
                        self.reinitialize_index(previous, requested.dimension)
                            .await;
                    }
                }

                self.persist(ModelState::ready()).await;
                info!("Model switch to {} complete", requested);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                let error_type = classify(&message);
                error!("Model switch failed ({}): {}", error_type, message);
                self.persist(ModelState::error(message.clone(), error_type))
                    .await;
                Err(SwitchError::model_load(message, error_type))
            }
        }
    }

    /// Current status, for display
    ///
    /// Never fails: a missing record or an inaccessible store reads as idle.
    pub async fn get_status(&self) -> StatusReport {
        match store::load_model_state(self.store.as_ref()).await {
            Ok(Some(state)) => state.into(),
            Ok(None) => ModelState::default().into(),
            Err(e) => {
                warn!("Status storage unavailable, reporting idle: {}", e);
                ModelState::default().into()
            }
        }
    }

    /// Overwrite the persisted status with a record pushed by the compute
    /// context
    ///
    /// Stored verbatim; progress is not checked for monotonicity, so a late
    /// push can regress displayed progress.
    pub async fn apply_external_status(&self, state: ModelState) -> Result<(), StoreError> {
        debug!(
            "Applying compute context status: {} {}%",
            state.status, state.download_progress
        );
        store::save_model_state(self.store.as_ref(), &state)
            .await
            .map_err(|e| {
                error!("Failed to update model status: {}", e);
                e
            })
    }

    /// Send one init request and wait, bounded, for its reply
    async fn request_engine_init(&self, config: &ModelConfiguration) -> Result<(), ChannelError> {
        let request = ComputeRequest::engine_init(config, false);
        let timeout = Duration::from_millis(self.config.reply_timeout_ms);

        let reply = match tokio::time::timeout(timeout, self.channel.send(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "Compute context did not reply within {}ms",
                    self.config.reply_timeout_ms
                );
                return Err(ChannelError::timeout(self.config.reply_timeout_ms));
            }
        };

        if reply.success {
            return Ok(());
        }

        let message = reply
            .error
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SWITCH_FAILURE.to_string());
        Err(ChannelError::rejected(message))
    }

    async fn reinitialize_index(&self, previous: u32, current: u32) {
        let Some(index) = &self.index else {
            debug!(
                "Embedding dimension changed {} -> {}, no index attached",
                previous, current
            );
            return;
        };

        info!(
            "Embedding dimension changed {} -> {}, reinitializing content index",
            previous, current
        );
        if let Err(e) = index.reinitialize().await {
            warn!("Failed to reinitialize content index: {:#}", e);
        }
    }

    /// Best-effort status write; failures are logged, never propagated
    async fn persist(&self, state: ModelState) {
        if let Err(e) = store::save_model_state(self.store.as_ref(), &state).await {
            error!("Failed to update model status to {}: {}", state.status, e);
        }
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod coordinator_test;
