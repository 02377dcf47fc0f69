/// Configuration for the model lifecycle coordinator
use serde::{Deserialize, Serialize};

/// Default bound on a compute context round trip
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 30_000;

/// Upper bound accepted for `reply_timeout_ms` (model downloads can be slow,
/// but an hour without a reply means the context is gone)
const MAX_REPLY_TIMEOUT_MS: u64 = 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// How long to wait for the compute context to answer an init request.
    /// Expiry is reported as a network-class error.
    pub reply_timeout_ms: u64,

    /// Queue overlapping `switch_model` calls instead of letting them race.
    /// Off by default: concurrent switches are last-write-wins.
    pub serialize_switches: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT_MS,
            serialize_switches: false,
        }
    }
}

impl CoordinatorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.reply_timeout_ms == 0 {
            return Err("reply_timeout_ms must be greater than 0".to_string());
        }

        if self.reply_timeout_ms > MAX_REPLY_TIMEOUT_MS {
            return Err(format!(
                "reply_timeout_ms cannot exceed {} (one hour)",
                MAX_REPLY_TIMEOUT_MS
            ));
        }

        Ok(())
    }
}
