//! Host configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `BRIDGE_STATE_PATH` | `~/.semantic-bridge/state.json` |
//! | `BRIDGE_WORKER_BIN` | `semantic-bridge-worker` (looked up on `PATH`) |
//! | `BRIDGE_WORKER_ARGS` | none (whitespace separated) |
//! | `BRIDGE_REPLY_TIMEOUT_MS` | `30000` |
//! | `BRIDGE_SERIALIZE_SWITCHES` | `false` |
//! | `BRIDGE_HTTP_PORT` | `3200` |

use anyhow::{anyhow, Context};
use semantic_bridge_core::store::JsonFileStatusStore;
use semantic_bridge_core::CoordinatorConfig;
use std::path::PathBuf;

pub const DEFAULT_WORKER_BIN: &str = "semantic-bridge-worker";
pub const DEFAULT_HTTP_PORT: u16 = 3200;

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub state_path: PathBuf,
    pub worker_bin: PathBuf,
    pub worker_args: Vec<String>,
    pub coordinator: CoordinatorConfig,
    pub http_port: u16,
}

impl HostConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let state_path = match var("BRIDGE_STATE_PATH") {
            Some(path) => PathBuf::from(path),
            None => JsonFileStatusStore::default_path()?,
        };

        let worker_bin = var("BRIDGE_WORKER_BIN")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKER_BIN));

        let worker_args = var("BRIDGE_WORKER_ARGS")
            .map(|args| args.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let mut coordinator = CoordinatorConfig::default();
        if let Some(ms) = var("BRIDGE_REPLY_TIMEOUT_MS") {
            coordinator.reply_timeout_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("BRIDGE_REPLY_TIMEOUT_MS is not a number: {}", ms))?;
        }
        if let Some(flag) = var("BRIDGE_SERIALIZE_SWITCHES") {
            coordinator.serialize_switches = parse_flag(&flag)
                .ok_or_else(|| anyhow!("BRIDGE_SERIALIZE_SWITCHES must be true or false, got {}", flag))?;
        }
        coordinator.validate().map_err(|e| anyhow!(e))?;

        let http_port = match var("BRIDGE_HTTP_PORT") {
            Some(port) => port
                .trim()
                .parse()
                .with_context(|| format!("BRIDGE_HTTP_PORT is not a port number: {}", port))?,
            None => DEFAULT_HTTP_PORT,
        };

        Ok(Self {
            state_path,
            worker_bin,
            worker_args,
            coordinator,
            http_port,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
