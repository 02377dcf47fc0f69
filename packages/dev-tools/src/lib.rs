//! Shared wiring for the Semantic Bridge host binaries
//!
//! - [`config`] - `HostConfig` read from `BRIDGE_*` environment variables
//! - [`host`] - builds the coordinator over a JSON state file and a spawned
//!   compute worker, and forwards worker status pushes into the store

pub mod config;
pub mod host;

pub use config::HostConfig;
pub use host::BridgeHost;
