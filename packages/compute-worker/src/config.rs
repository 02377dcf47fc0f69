/// Configuration for the compute worker
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the model directory
pub const MODELS_DIR_ENV: &str = "BRIDGE_MODELS_DIR";

/// Environment variable overriding the number of progress ticks
pub const PROGRESS_STEPS_ENV: &str = "BRIDGE_PROGRESS_STEPS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Root of the per-preset model directories
    pub models_dir: Option<PathBuf>,

    /// `downloading` pushes emitted per load (the last one reports 100%)
    pub progress_steps: u8,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            models_dir: None,
            progress_steps: 4,
        }
    }
}

impl WorkerConfig {
    /// Defaults overridden by `BRIDGE_MODELS_DIR` and `BRIDGE_PROGRESS_STEPS`
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var(MODELS_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.models_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(steps) = std::env::var(PROGRESS_STEPS_ENV) {
            config.progress_steps = steps
                .trim()
                .parse()
                .map_err(|e| format!("{} must be an integer: {}", PROGRESS_STEPS_ENV, e))?;
        }

        Ok(config)
    }

    /// Get the models directory, falling back to ~/.semantic-bridge/models/
    ///
    /// - macOS/Linux: ~/.semantic-bridge/models/
    /// - Windows: %USERPROFILE%\.semantic-bridge\models\
    ///
    /// The directory does not have to exist yet; a missing model file is
    /// reported per request.
    pub fn resolve_models_dir(&self) -> Result<PathBuf, std::io::Error> {
        if let Some(path) = &self.models_dir {
            return Ok(path.clone());
        }

        let home_dir = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Cannot determine home directory",
            )
        })?;

        Ok(home_dir.join(".semantic-bridge").join("models"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.progress_steps == 0 {
            return Err("progress_steps must be greater than 0".to_string());
        }

        if self.progress_steps > 100 {
            return Err("progress_steps cannot exceed 100".to_string());
        }

        if let Some(path) = &self.models_dir {
            if path.as_os_str().is_empty() {
                return Err("models_dir cannot be empty".to_string());
            }
        }

        Ok(())
    }
}
