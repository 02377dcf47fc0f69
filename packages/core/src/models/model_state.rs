//! Persisted Model State
//!
//! `ModelState` is the single, last-write-wins record describing what the
//! lifecycle coordinator (or the compute context) is currently doing with the
//! embedding model. It is overwritten wholesale on every transition and is
//! never deleted; a missing record reads as the default idle state.
//!
//! `StatusReport` is the projection returned to status queries. It renames
//! `status` to `initializationStatus` to match the control protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Lifecycle status of the embedding model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    #[default]
    Idle,
    Downloading,
    Initializing,
    Ready,
    Error,
}

impl ModelStatus {
    /// `downloading` and `initializing` both count as in-progress work
    pub fn is_downloading(self) -> bool {
        matches!(self, Self::Downloading | Self::Initializing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Downloading => "downloading",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse failure category used by presentation layers to suggest remediation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelErrorType {
    Network,
    File,
    Unknown,
}

impl ModelErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::File => "file",
            Self::Unknown => "unknown",
        }
    }

    /// Lenient parse: anything unrecognised is `Unknown`
    fn from_wire(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "network" => Self::Network,
            "file" => Self::File,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ModelErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted record under the `modelState` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelState {
    pub status: ModelStatus,

    /// Percentage 0..=100
    pub download_progress: u8,

    /// Derived from `status` when written by the coordinator; pushed records
    /// are stored verbatim.
    pub is_downloading: bool,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,

    /// Empty when the state carries no error
    #[serde(default)]
    pub error_message: String,

    /// Serialized as `""` when absent
    #[serde(default, with = "error_type_field")]
    pub error_type: Option<ModelErrorType>,
}

impl Default for ModelState {
    fn default() -> Self {
        Self::new(ModelStatus::Idle, 0)
    }
}

impl ModelState {
    /// Build a fresh state stamped with the current time
    ///
    /// Progress above 100 is clamped.
    pub fn new(status: ModelStatus, progress: u8) -> Self {
        Self {
            status,
            download_progress: progress.min(100),
            is_downloading: status.is_downloading(),
            last_updated: Utc::now(),
            error_message: String::new(),
            error_type: None,
        }
    }

    pub fn downloading(progress: u8) -> Self {
        Self::new(ModelStatus::Downloading, progress)
    }

    pub fn ready() -> Self {
        Self::new(ModelStatus::Ready, 100)
    }

    /// Terminal failure state, always at 0% progress
    pub fn error(message: impl Into<String>, error_type: ModelErrorType) -> Self {
        Self {
            error_message: message.into(),
            error_type: Some(error_type),
            ..Self::new(ModelStatus::Error, 0)
        }
    }
}

/// Status projection returned by `GET_MODEL_STATUS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub initialization_status: ModelStatus,
    pub download_progress: u8,
    pub is_downloading: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ModelErrorType>,
}

impl From<ModelState> for StatusReport {
    fn from(state: ModelState) -> Self {
        Self {
            initialization_status: state.status,
            download_progress: state.download_progress,
            is_downloading: state.is_downloading,
            last_updated: state.last_updated,
            error_message: Some(state.error_message).filter(|m| !m.is_empty()),
            error_type: state.error_type,
        }
    }
}

mod error_type_field {
    use super::ModelErrorType;
    use super::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<ModelErrorType>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(error_type) => error_type.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ModelErrorType>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(match raw.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(ModelErrorType::from_wire(s)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_downloading_derivation() {
        assert!(ModelState::downloading(10).is_downloading);
        assert!(ModelState::new(ModelStatus::Initializing, 90).is_downloading);
        assert!(!ModelState::ready().is_downloading);
        assert!(!ModelState::default().is_downloading);
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(ModelState::downloading(250).download_progress, 100);
    }

    #[test]
    fn test_serializes_with_protocol_field_names() {
        let state = ModelState::error("boom", ModelErrorType::File);
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["downloadProgress"], 0);
        assert_eq!(value["isDownloading"], false);
        assert_eq!(value["errorMessage"], "boom");
        assert_eq!(value["errorType"], "file");
        assert!(value["lastUpdated"].is_i64());
    }

    #[test]
    fn test_absent_error_type_round_trips_as_empty_string() {
        let value = serde_json::to_value(ModelState::ready()).unwrap();
        assert_eq!(value["errorType"], "");
        assert_eq!(value["errorMessage"], "");

        let back: ModelState = serde_json::from_value(value).unwrap();
        assert_eq!(back.error_type, None);
    }

    #[test]
    fn test_deserializes_pushed_record_without_error_fields() {
        let pushed = json!({
            "status": "downloading",
            "downloadProgress": 42,
            "isDownloading": true,
            "lastUpdated": 1_700_000_000_000i64
        });

        let state: ModelState = serde_json::from_value(pushed).unwrap();
        assert_eq!(state.status, ModelStatus::Downloading);
        assert_eq!(state.download_progress, 42);
        assert!(state.error_message.is_empty());
        assert_eq!(state.error_type, None);
        assert_eq!(state.last_updated.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_unrecognised_error_type_reads_as_unknown() {
        let pushed = json!({
            "status": "error",
            "downloadProgress": 0,
            "isDownloading": false,
            "lastUpdated": 0,
            "errorMessage": "out of memory",
            "errorType": "oom"
        });

        let state: ModelState = serde_json::from_value(pushed).unwrap();
        assert_eq!(state.error_type, Some(ModelErrorType::Unknown));
    }

    #[test]
    fn test_status_report_projection() {
        let report = StatusReport::from(ModelState::ready());
        assert_eq!(report.initialization_status, ModelStatus::Ready);
        assert_eq!(report.download_progress, 100);
        assert_eq!(report.error_message, None);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["initializationStatus"], "ready");
        assert!(value.get("errorMessage").is_none());

        let failed = StatusReport::from(ModelState::error("timeout", ModelErrorType::Network));
        assert_eq!(failed.error_message.as_deref(), Some("timeout"));
        assert_eq!(failed.error_type, Some(ModelErrorType::Network));
    }
}
