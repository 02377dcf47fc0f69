//! JSON file status store
//!
//! All keys live in a single JSON object on disk. Reads of a missing file
//! behave like an empty store. Writes re-read the file, replace one key, and
//! swap the result in with write-to-temp-then-rename so a crash mid-write
//! never leaves a truncated state file behind.

use super::{StatusStore, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct JsonFileStatusStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileStatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Default state file: `~/.semantic-bridge/state.json`
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| StoreError::unavailable("Cannot determine home directory"))?;
        Ok(home_dir.join(".semantic-bridge").join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(map_io_error(&self.path, e)),
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::serialization(format!(
                "State file {:?} does not contain a JSON object (found {})",
                self.path, other
            ))),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| map_io_error(parent, e))?;
            }
        }

        let serialized = serde_json::to_string_pretty(map)?;
        let temp_file = self.path.with_extension("json.tmp");

        // Atomic write: write to temp file, then rename
        fs::write(&temp_file, serialized)
            .await
            .map_err(|e| map_io_error(&temp_file, e))?;
        fs::rename(&temp_file, &self.path)
            .await
            .map_err(|e| map_io_error(&self.path, e))?;

        Ok(())
    }
}

#[async_trait]
impl StatusStore for JsonFileStatusStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value);
        self.write_all(&map).await
    }
}

fn map_io_error(path: &Path, err: std::io::Error) -> StoreError {
    if err.kind() == ErrorKind::PermissionDenied {
        StoreError::unavailable(format!("permission denied for {:?}", path))
    } else {
        StoreError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStatusStore::new(temp_dir.path().join("state.json"));

        assert_eq!(store.get("modelState").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_preserves_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("state.json");
        let store = JsonFileStatusStore::new(&path);

        store.set("selectedModel", json!("e5-small-v2")).await.unwrap();
        store.set("modelState", json!({"status": "idle"})).await.unwrap();

        assert_eq!(
            store.get("selectedModel").await.unwrap(),
            Some(json!("e5-small-v2"))
        );
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");

        JsonFileStatusStore::new(&path)
            .set("selectedVersion", json!("full"))
            .await
            .unwrap();

        let reopened = JsonFileStatusStore::new(&path);
        assert_eq!(
            reopened.get("selectedVersion").await.unwrap(),
            Some(json!("full"))
        );
    }

    #[tokio::test]
    async fn test_non_object_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        tokio::fs::write(&path, "[1, 2, 3]").await.unwrap();

        let store = JsonFileStatusStore::new(&path);
        assert!(matches!(
            store.get("modelState").await,
            Err(StoreError::Serialization(_))
        ));
    }
}
