//! Status ordering between worker pushes and the switch outcome
//!
//! The worker is a shell script that streams progress pushes and then
//! replies, all in one burst. Whatever the worker pushed ahead of its reply
//! must never overwrite the final state written by the coordinator.
#![cfg(unix)]

use semantic_bridge_core::bridge::handle_line;
use semantic_bridge_core::models::ModelState;
use semantic_bridge_core::store::{self, JsonFileStatusStore};
use semantic_bridge_core::{CoordinatorConfig, ModelErrorType, ModelStatus};
use semantic_bridge_dev_tools::{BridgeHost, HostConfig};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const SWITCH: &str = r#"{"type": "SWITCH_SEMANTIC_MODEL", "modelPreset": "multilingual-e5-small"}"#;

fn push(status: &str, progress: u8) -> String {
    let downloading = matches!(status, "downloading" | "initializing");
    format!(
        r#"echo '{{"type":"UPDATE_MODEL_STATUS","modelState":{{"status":"{status}","downloadProgress":{progress},"isDownloading":{downloading},"lastUpdated":0}}}}'"#
    )
}

/// A worker that answers one request with four download ticks, an
/// initializing push, any `extra` pushes and then `reply`
fn chatty_worker(extra: &[(&str, u8)], reply: &str) -> Vec<String> {
    let mut script = vec!["read line".to_string()];
    for progress in [25, 50, 75, 100] {
        script.push(push("downloading", progress));
    }
    script.push(push("initializing", 100));
    for (status, progress) in extra {
        script.push(push(status, *progress));
    }
    script.push(format!("echo '{reply}'"));
    script.push("sleep 5".to_string());

    vec!["-c".to_string(), script.join("\n")]
}

fn config_in(dir: &TempDir, worker_args: Vec<String>) -> HostConfig {
    HostConfig {
        state_path: dir.path().join("state.json"),
        worker_bin: "sh".into(),
        worker_args,
        coordinator: CoordinatorConfig::default(),
        http_port: 0,
    }
}

async fn saved_state(path: &Path) -> ModelState {
    store::load_model_state(&JsonFileStatusStore::new(path))
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_successful_switch_ends_ready_after_worker_pushes() {
    for _ in 0..5 {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, chatty_worker(&[], r#"{"replyTo":1,"success":true}"#));
        let host = BridgeHost::build(&config).unwrap();

        let reply = handle_line(&host.coordinator, SWITCH).await;
        assert!(reply.success, "switch failed: {:?}", reply.error);

        // Nothing the worker sent may land after the final write
        tokio::time::sleep(Duration::from_millis(300)).await;
        let state = saved_state(&config.state_path).await;
        assert_eq!(state.status, ModelStatus::Ready);
        assert_eq!(state.download_progress, 100);
        assert!(!state.is_downloading);

        let status = handle_line(&host.coordinator, r#"{"type": "GET_MODEL_STATUS"}"#).await;
        assert_eq!(
            status.status.unwrap().initialization_status,
            ModelStatus::Ready
        );

        host.shutdown().await;
    }
}

#[tokio::test]
async fn test_failed_switch_ends_in_error_after_worker_pushes() {
    for _ in 0..5 {
        let dir = TempDir::new().unwrap();
        let config = config_in(
            &dir,
            chatty_worker(
                &[],
                r#"{"replyTo":1,"success":false,"error":"invalid onnx file"}"#,
            ),
        );
        let host = BridgeHost::build(&config).unwrap();

        let reply = handle_line(&host.coordinator, SWITCH).await;
        assert!(!reply.success);

        tokio::time::sleep(Duration::from_millis(300)).await;
        let state = saved_state(&config.state_path).await;
        assert_eq!(state.status, ModelStatus::Error);
        assert_eq!(state.error_message, "invalid onnx file");
        assert_eq!(state.error_type, Some(ModelErrorType::File));
        assert!(!state.is_downloading);

        host.shutdown().await;
    }
}

#[tokio::test]
async fn test_default_engine_ends_ready_after_worker_pushes() {
    // Startup does not write state itself, so the worker's own terminal
    // push is what settles the record
    let dir = TempDir::new().unwrap();
    let config = config_in(
        &dir,
        chatty_worker(&[("ready", 100)], r#"{"replyTo":1,"success":true}"#),
    );
    let host = BridgeHost::build(&config).unwrap();

    host.start_default_engine().await.unwrap();
    assert!(host.coordinator.current_configuration().is_some());

    tokio::time::sleep(Duration::from_millis(300)).await;
    let state = saved_state(&config.state_path).await;
    assert_eq!(state.status, ModelStatus::Ready);

    host.shutdown().await;
}
