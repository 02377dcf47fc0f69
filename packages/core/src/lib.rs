//! Semantic Bridge Core
//!
//! Orchestrator-side lifecycle management for the embedding model that powers
//! semantic similarity. The model itself runs in an isolated compute context;
//! this crate decides when it must be (re)loaded, drives the load over a
//! request/reply channel and keeps an externally observable status record.
//!
//! # Modules
//!
//! - [`models`] - Model presets, configurations and the persisted `ModelState`
//! - [`store`] - Durable key-value status storage (memory and JSON file backends)
//! - [`compute`] - Compute context traits and the child-process implementation
//! - [`services`] - `ModelLifecycleCoordinator` and the error classifier
//! - [`bridge`] - Inbound control-message dispatcher and JSON-lines server
//! - [`config`] - Coordinator tuning

pub mod bridge;
pub mod compute;
pub mod config;
pub mod models;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use config::CoordinatorConfig;
pub use models::*;
pub use services::*;
