//! Data Models
//!
//! This module contains the data structures exchanged between the orchestrator,
//! the compute context and the status store:
//!
//! - `ModelConfiguration` - One loadable model variant (preset, version, dimension)
//! - `ModelState` - The persisted, externally observable lifecycle record
//! - `StatusReport` - Projection of `ModelState` returned to status queries

mod model_config;
mod model_state;

pub use model_config::{
    ModelConfiguration, ModelInfo, ModelPreset, ModelVersion, SelectedModelPreference,
    DEFAULT_MODEL_PRESET, DEFAULT_MODEL_VERSION,
};
pub use model_state::{ModelErrorType, ModelState, ModelStatus, StatusReport};
