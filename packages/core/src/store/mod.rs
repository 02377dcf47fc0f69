//! Status Store - Durable Key-Value Persistence
//!
//! The lifecycle coordinator persists exactly three records:
//!
//! - `modelState` - the last-write-wins `ModelState`
//! - `selectedModel` / `selectedVersion` - the user's preferred preset and
//!   weight format, read at startup to pick the default engine
//!
//! `StatusStore` abstracts the backend so the coordinator can run against an
//! in-memory map in tests and a JSON file in the host process. Values are
//! plain `serde_json::Value`s; the typed helpers below do the decoding.

mod error;
mod json_file;
mod memory;

pub use error::StoreError;
pub use json_file::JsonFileStatusStore;
pub use memory::MemoryStatusStore;

use crate::models::{ModelPreset, ModelState, ModelVersion, SelectedModelPreference};
use async_trait::async_trait;
use serde_json::Value;

/// Key of the persisted `ModelState` record
pub const MODEL_STATE_KEY: &str = "modelState";

/// Key of the preferred preset id
pub const SELECTED_MODEL_KEY: &str = "selectedModel";

/// Key of the preferred weight format
pub const SELECTED_VERSION_KEY: &str = "selectedVersion";

/// Durable, process-wide key-value store
///
/// Implementations must survive orchestrator restarts (except test doubles)
/// and must be `Send + Sync` so one instance can be shared behind an `Arc`.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Read a value, `Ok(None)` when the key has never been written
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrite a value
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Read the persisted `ModelState`, if any
pub async fn load_model_state(store: &dyn StatusStore) -> Result<Option<ModelState>, StoreError> {
    match store.get(MODEL_STATE_KEY).await? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// Overwrite the persisted `ModelState`
pub async fn save_model_state(store: &dyn StatusStore, state: &ModelState) -> Result<(), StoreError> {
    store
        .set(MODEL_STATE_KEY, serde_json::to_value(state)?)
        .await
}

/// Read the user's preferred model, falling back to defaults for absent keys
///
/// A stored preset or version that is not in the registry is an error: the
/// caller cannot resolve a dimension for it.
pub async fn load_selected_preference(
    store: &dyn StatusStore,
) -> Result<SelectedModelPreference, StoreError> {
    let mut preference = SelectedModelPreference::default();

    if let Some(preset) = read_string(store, SELECTED_MODEL_KEY).await? {
        preference.preset = preset
            .parse::<ModelPreset>()
            .map_err(StoreError::serialization)?;
    }

    if let Some(version) = read_string(store, SELECTED_VERSION_KEY).await? {
        preference.version = version
            .parse::<ModelVersion>()
            .map_err(StoreError::serialization)?;
    }

    Ok(preference)
}

/// Persist the user's preferred model
pub async fn save_selected_preference(
    store: &dyn StatusStore,
    preference: SelectedModelPreference,
) -> Result<(), StoreError> {
    store
        .set(SELECTED_MODEL_KEY, Value::String(preference.preset.id().to_string()))
        .await?;
    store
        .set(
            SELECTED_VERSION_KEY,
            Value::String(preference.version.as_str().to_string()),
        )
        .await
}

/// Empty strings are treated the same as missing keys
async fn read_string(store: &dyn StatusStore, key: &str) -> Result<Option<String>, StoreError> {
    match store.get(key).await? {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s)),
        Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
        Some(other) => Err(StoreError::serialization(format!(
            "Expected string under '{}', found {}",
            key, other
        ))),
    }
}
