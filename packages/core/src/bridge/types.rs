//! Control message and reply types

use crate::models::{ModelPreset, ModelState, ModelVersion, StatusReport};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field carrying the optional client correlation id
pub const REQUEST_ID_FIELD: &str = "requestId";

/// Inbound control message, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Load a model variant in the compute context
    #[serde(rename = "SWITCH_SEMANTIC_MODEL", rename_all = "camelCase")]
    SwitchSemanticModel {
        model_preset: ModelPreset,
        #[serde(default)]
        model_version: ModelVersion,
        /// Resolved from the preset registry when omitted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model_dimension: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_dimension: Option<u32>,
    },

    /// Read the current status record
    #[serde(rename = "GET_MODEL_STATUS")]
    GetModelStatus,

    /// Overwrite the status record with one pushed by the compute context
    #[serde(rename = "UPDATE_MODEL_STATUS", rename_all = "camelCase")]
    UpdateModelStatus { model_state: ModelState },
}

impl ControlMessage {
    /// Wire name of the message type, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SwitchSemanticModel { .. } => "SWITCH_SEMANTIC_MODEL",
            Self::GetModelStatus => "GET_MODEL_STATUS",
            Self::UpdateModelStatus { .. } => "UPDATE_MODEL_STATUS",
        }
    }
}

/// Reply to a control message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Value>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    pub fn ok() -> Self {
        Self {
            request_id: None,
            success: true,
            status: None,
            error: None,
        }
    }

    pub fn with_status(status: StatusReport) -> Self {
        Self {
            status: Some(status),
            ..Self::ok()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            request_id: None,
            success: false,
            status: None,
            error: Some(error.into()),
        }
    }

    /// Echo the caller's correlation id
    pub fn for_request(mut self, request_id: Option<Value>) -> Self {
        self.request_id = request_id;
        self
    }
}
