//! Lifecycle Error Types
//!
//! Errors returned by `ModelLifecycleCoordinator::switch_model`. Both variants
//! are terminal for the current attempt; they have already been persisted as
//! an `error` ModelState by the time the caller sees them.

use crate::compute::ContextError;
use crate::models::ModelErrorType;
use thiserror::Error;

/// A model switch attempt failed
#[derive(Error, Debug)]
pub enum SwitchError {
    /// The compute context could not be made ready (environment problem)
    #[error(transparent)]
    ComputeContext(#[from] ContextError),

    /// The compute context failed to load the model, or never answered
    #[error("{message}")]
    ModelLoad {
        message: String,
        error_type: ModelErrorType,
    },
}

impl SwitchError {
    /// Create a model load error
    pub fn model_load(message: impl Into<String>, error_type: ModelErrorType) -> Self {
        Self::ModelLoad {
            message: message.into(),
            error_type,
        }
    }

    /// Category persisted alongside the error message
    pub fn error_type(&self) -> ModelErrorType {
        match self {
            Self::ComputeContext(_) => ModelErrorType::Unknown,
            Self::ModelLoad { error_type, .. } => *error_type,
        }
    }
}
