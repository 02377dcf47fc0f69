//! Control Message Handlers
//!
//! Every handler resolves to a `BridgeResponse`; failures are reported in the
//! reply body, never as a transport error.

use crate::bridge::types::{BridgeResponse, ControlMessage, REQUEST_ID_FIELD};
use crate::models::{ModelConfiguration, ModelPreset, ModelState, ModelVersion};
use crate::services::ModelLifecycleCoordinator;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Parse one inbound line and dispatch it
///
/// Malformed JSON, a missing or unknown `type` and invalid payloads all yield
/// `{success: false, error}`. The `requestId` is echoed whenever the line was
/// at least a JSON object.
pub async fn handle_line(coordinator: &ModelLifecycleCoordinator, line: &str) -> BridgeResponse {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!("❌ Failed to parse control message: {}", e);
            return BridgeResponse::failed(format!("Invalid JSON: {}", e));
        }
    };

    let request_id = value.get(REQUEST_ID_FIELD).cloned();

    let message: ControlMessage = match serde_json::from_value(value) {
        Ok(message) => message,
        Err(e) => {
            warn!("❌ Unsupported control message: {}", e);
            return BridgeResponse::failed(format!("Invalid control message: {}", e))
                .for_request(request_id);
        }
    };

    dispatch(coordinator, message).await.for_request(request_id)
}

/// Route a parsed control message to the coordinator
#[instrument(skip(coordinator, message), fields(kind = message.kind()))]
pub async fn dispatch(
    coordinator: &ModelLifecycleCoordinator,
    message: ControlMessage,
) -> BridgeResponse {
    match message {
        ControlMessage::SwitchSemanticModel {
            model_preset,
            model_version,
            model_dimension,
            previous_dimension,
        } => {
            handle_switch(
                coordinator,
                model_preset,
                model_version,
                model_dimension,
                previous_dimension,
            )
            .await
        }
        ControlMessage::GetModelStatus => {
            BridgeResponse::with_status(coordinator.get_status().await)
        }
        ControlMessage::UpdateModelStatus { model_state } => {
            handle_update_status(coordinator, model_state).await
        }
    }
}

async fn handle_switch(
    coordinator: &ModelLifecycleCoordinator,
    preset: ModelPreset,
    version: ModelVersion,
    dimension: Option<u32>,
    previous_dimension: Option<u32>,
) -> BridgeResponse {
    let requested = ModelConfiguration::new(
        preset,
        version,
        dimension.unwrap_or_else(|| preset.dimension()),
    );

    if let Err(e) = requested.validate() {
        warn!("⚠️  Rejecting switch request: {}", e);
        return BridgeResponse::failed(e);
    }

    match coordinator.switch_model(requested, previous_dimension).await {
        Ok(()) => {
            debug!("✅ Switch to {} succeeded", requested);
            BridgeResponse::ok()
        }
        Err(e) => BridgeResponse::failed(e.to_string()),
    }
}

async fn handle_update_status(
    coordinator: &ModelLifecycleCoordinator,
    model_state: ModelState,
) -> BridgeResponse {
    match coordinator.apply_external_status(model_state).await {
        Ok(()) => BridgeResponse::ok(),
        Err(e) => BridgeResponse::failed(e.to_string()),
    }
}

#[cfg(test)]
#[path = "handlers_test.rs"]
mod handlers_test;
