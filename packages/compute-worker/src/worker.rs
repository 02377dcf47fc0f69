/// JSON-lines request loop
///
/// Requests are handled one at a time, in arrival order. Status pushes are
/// written as the loader produces them. Every load ends with a terminal
/// `ready` or `error` push, then the reply.
use crate::loader::ModelLoader;
use semantic_bridge_core::compute::messages::{ReplyEnvelope, RequestEnvelope, StatusUpdate};
use semantic_bridge_core::compute::ComputeReply;
use semantic_bridge_core::models::ModelState;
use semantic_bridge_core::services::classify;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Serve init requests from `reader` until EOF
pub async fn run_worker<R, W>(mut loader: ModelLoader, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(
        "🧠 Compute worker started (models: {})",
        loader.models_dir().display()
    );
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let envelope: RequestEnvelope = match serde_json::from_str(&line) {
            Ok(envelope) => envelope,
            Err(e) => {
                match request_id(&line) {
                    Some(id) => {
                        warn!("❌ Unreadable request {}: {}", id, e);
                        let reply = ComputeReply::failed(format!("Invalid request: {}", e));
                        write_line(&mut writer, &ReplyEnvelope { reply_to: id, reply }).await?;
                    }
                    None => warn!("❌ Ignoring input without a request id: {}", e),
                }
                continue;
            }
        };

        debug!("📥 Request {}", envelope.id);
        let (push_tx, mut push_rx) = mpsc::unbounded_channel();
        let loading = &mut loader;
        let request = &envelope.request;
        let load = async move {
            loading
                .load(request, move |state| {
                    let _ = push_tx.send(state);
                })
                .await
        };
        let stream = async {
            while let Some(state) = push_rx.recv().await {
                write_line(&mut writer, &StatusUpdate::new(state)).await?;
            }
            anyhow::Ok(())
        };
        let (result, streamed) = tokio::join!(load, stream);
        streamed?;

        let (terminal, reply) = match result {
            Ok(_) => (ModelState::ready(), ComputeReply::ok()),
            Err(e) => {
                error!("❌ Request {} failed: {}", envelope.id, e);
                let message = e.to_string();
                let error_type = classify(&message);
                (
                    ModelState::error(message.clone(), error_type),
                    ComputeReply::failed(message),
                )
            }
        };
        write_line(&mut writer, &StatusUpdate::new(terminal)).await?;
        write_line(
            &mut writer,
            &ReplyEnvelope {
                reply_to: envelope.id,
                reply,
            },
        )
        .await?;
    }

    info!("🧠 Compute worker stopped (input closed)");
    Ok(())
}

async fn write_line<W, T>(writer: &mut W, message: &T) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json = serde_json::to_string(message)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

fn request_id(line: &str) -> Option<u64> {
    serde_json::from_str::<Value>(line).ok()?.get("id")?.as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerConfig;
    use semantic_bridge_core::compute::{ComputeRequest, WorkerMessage};
    use semantic_bridge_core::models::{
        ModelConfiguration, ModelErrorType, ModelPreset, ModelStatus, ModelVersion,
    };
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::BufReader;

    async fn run(dir: &TempDir, input: String) -> Vec<WorkerMessage> {
        let loader = ModelLoader::new(WorkerConfig {
            models_dir: Some(dir.path().to_path_buf()),
            progress_steps: 2,
        })
        .unwrap();

        let mut output = Vec::new();
        run_worker(loader, BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn request_line(id: u64, config: &ModelConfiguration, use_local_files: bool) -> String {
        let envelope = RequestEnvelope {
            id,
            request: ComputeRequest::engine_init(config, use_local_files),
        };
        format!("{}\n", serde_json::to_string(&envelope).unwrap())
    }

    fn replies(messages: &[WorkerMessage]) -> Vec<(u64, ComputeReply)> {
        messages
            .iter()
            .filter_map(|message| match message {
                WorkerMessage::Reply(envelope) => {
                    Some((envelope.reply_to, envelope.reply.clone()))
                }
                WorkerMessage::StatusUpdate(_) => None,
            })
            .collect()
    }

    fn statuses(messages: &[WorkerMessage]) -> Vec<ModelStatus> {
        messages
            .iter()
            .map(|message| match message {
                WorkerMessage::StatusUpdate(update) => update.model_state.status,
                WorkerMessage::Reply(_) => panic!("reply before status pushes"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_successful_load_pushes_then_replies() {
        let dir = TempDir::new().unwrap();
        let config =
            ModelConfiguration::for_preset(ModelPreset::AllMiniLmL6V2, ModelVersion::Compressed);
        let model = dir
            .path()
            .join("all-minilm-l6-v2")
            .join("model_compressed.onnx");
        std::fs::create_dir_all(model.parent().unwrap()).unwrap();
        std::fs::write(&model, b"weights").unwrap();

        let messages = run(&dir, request_line(7, &config, true)).await;

        assert_eq!(messages.len(), 5);
        assert_eq!(
            statuses(&messages[..4]),
            vec![
                ModelStatus::Downloading,
                ModelStatus::Downloading,
                ModelStatus::Initializing,
                ModelStatus::Ready
            ]
        );
        assert_eq!(replies(&messages), vec![(7, ComputeReply::ok())]);
    }

    #[tokio::test]
    async fn test_failures_reply_with_error() {
        let dir = TempDir::new().unwrap();
        let config =
            ModelConfiguration::for_preset(ModelPreset::E5SmallV2, ModelVersion::Quantized);

        let messages = run(&dir, request_line(1, &config, false)).await;

        let replies = replies(&messages);
        assert_eq!(replies.len(), 1);
        assert!(!replies[0].1.success);
        let error = replies[0].1.error.clone().unwrap();
        assert!(error.starts_with("Failed to fetch model weights (network)"));

        // The last push mirrors the failed reply
        match &messages[messages.len() - 2] {
            WorkerMessage::StatusUpdate(update) => {
                assert_eq!(update.model_state.status, ModelStatus::Error);
                assert_eq!(update.model_state.error_message, error);
                assert_eq!(update.model_state.error_type, Some(ModelErrorType::Network));
            }
            other => panic!("expected error push, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pushes_are_written_while_input_stays_open() {
        let dir = TempDir::new().unwrap();
        let config =
            ModelConfiguration::for_preset(ModelPreset::E5SmallV2, ModelVersion::Quantized);
        let loader = ModelLoader::new(WorkerConfig {
            models_dir: Some(dir.path().to_path_buf()),
            progress_steps: 4,
        })
        .unwrap();

        let (mut input, worker_input) = tokio::io::duplex(1024);
        let (worker_output, output) = tokio::io::duplex(1024);
        let worker = tokio::spawn(run_worker(loader, BufReader::new(worker_input), worker_output));

        input
            .write_all(request_line(1, &config, false).as_bytes())
            .await
            .unwrap();

        let mut lines = BufReader::new(output).lines();
        let mut seen = Vec::new();
        loop {
            let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            let message: WorkerMessage = serde_json::from_str(&line).unwrap();
            let done = matches!(message, WorkerMessage::Reply(_));
            seen.push(message);
            if done {
                break;
            }
        }

        assert_eq!(
            statuses(&seen[..seen.len() - 1]),
            vec![
                ModelStatus::Downloading,
                ModelStatus::Downloading,
                ModelStatus::Downloading,
                ModelStatus::Downloading,
                ModelStatus::Initializing,
                ModelStatus::Error
            ]
        );
        assert!(!worker.is_finished());

        drop(input);
        worker.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let input = "not json\n\n{\"id\": 3, \"target\": \"compute\"}\n".to_string();

        let messages = run(&dir, input).await;

        let replies = replies(&messages);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, 3);
        assert!(replies[0]
            .1
            .error
            .as_deref()
            .unwrap()
            .starts_with("Invalid request"));
    }
}
