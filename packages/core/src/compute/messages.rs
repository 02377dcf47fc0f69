//! Compute Context Wire Messages
//!
//! Requests sent to the compute context and the lines it sends back. The
//! request body matches the control protocol exactly:
//!
//! ```json
//! {
//!     "target": "compute",
//!     "type": "SIMILARITY_ENGINE_INIT",
//!     "config": {
//!         "useLocalFiles": false,
//!         "modelPreset": "multilingual-e5-small",
//!         "modelVersion": "quantized",
//!         "modelDimension": 384,
//!         "forceOffscreen": true
//!     }
//! }
//! ```
//!
//! Over a process transport each request is wrapped with an `id`, and the
//! worker answers with `{"replyTo": id, "success": bool, "error"?: string}`.
//! The worker may also push `UPDATE_MODEL_STATUS` lines at any time.

use crate::models::{ModelConfiguration, ModelPreset, ModelState, ModelVersion};
use serde::{Deserialize, Serialize};

/// Target identifier of the compute context
pub const COMPUTE_TARGET: &str = "compute";

/// Operation requested of the compute context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeMessageType {
    #[serde(rename = "SIMILARITY_ENGINE_INIT")]
    SimilarityEngineInit,
}

/// Configuration carried by `SIMILARITY_ENGINE_INIT`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInitConfig {
    pub use_local_files: bool,
    pub model_preset: ModelPreset,
    pub model_version: ModelVersion,
    pub model_dimension: u32,
    pub force_offscreen: bool,
}

impl EngineInitConfig {
    /// The model variant this request asks for
    pub fn model_configuration(&self) -> ModelConfiguration {
        ModelConfiguration::new(self.model_preset, self.model_version, self.model_dimension)
    }
}

/// Request addressed to the compute context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeRequest {
    pub target: String,
    #[serde(rename = "type")]
    pub message_type: ComputeMessageType,
    pub config: EngineInitConfig,
}

impl ComputeRequest {
    /// Build an engine initialization request that always runs in the
    /// isolated context
    pub fn engine_init(config: &ModelConfiguration, use_local_files: bool) -> Self {
        Self {
            target: COMPUTE_TARGET.to_string(),
            message_type: ComputeMessageType::SimilarityEngineInit,
            config: EngineInitConfig {
                use_local_files,
                model_preset: config.preset,
                model_version: config.version,
                model_dimension: config.dimension,
                force_offscreen: true,
            },
        }
    }
}

/// One-shot reply to a `ComputeRequest`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComputeReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComputeReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A request framed for a stream transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub id: u64,
    #[serde(flatten)]
    pub request: ComputeRequest,
}

/// A reply framed for a stream transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    #[serde(rename = "replyTo")]
    pub reply_to: u64,
    #[serde(flatten)]
    pub reply: ComputeReply,
}

/// Marker for status pushes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusUpdateType {
    #[serde(rename = "UPDATE_MODEL_STATUS")]
    UpdateModelStatus,
}

/// Unsolicited status record pushed by the compute context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(rename = "type")]
    pub message_type: StatusUpdateType,
    #[serde(rename = "modelState")]
    pub model_state: ModelState,
}

impl StatusUpdate {
    pub fn new(model_state: ModelState) -> Self {
        Self {
            message_type: StatusUpdateType::UpdateModelStatus,
            model_state,
        }
    }
}

/// Any line a worker may write to its output stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerMessage {
    Reply(ReplyEnvelope),
    StatusUpdate(StatusUpdate),
}
