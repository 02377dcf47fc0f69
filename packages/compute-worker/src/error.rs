/// Error types for the compute worker
///
/// Display text travels back to the orchestrator as the reply's `error` and
/// is classified there by keyword, so each variant names its category.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid model dimension for {preset}: expected {expected}, got {actual}")]
    DimensionMismatch {
        preset: String,
        expected: u32,
        actual: u32,
    },

    #[error("Model file not found or corrupt at path: {0}")]
    ModelNotFound(String),

    #[error("Model file is empty or corrupt: {0}")]
    EmptyModelFile(String),

    #[error("Failed to fetch model weights (network): {0}")]
    FetchFailed(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
