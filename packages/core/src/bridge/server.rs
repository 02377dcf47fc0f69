//! JSON-Lines Bridge Server
//!
//! Reads control messages line by line, handles each on its own task and
//! writes replies in completion order through a single writer task.

use crate::bridge::handlers::handle_line;
use crate::bridge::types::BridgeResponse;
use crate::services::ModelLifecycleCoordinator;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};

/// Replies buffered ahead of the writer
const RESPONSE_QUEUE_SIZE: usize = 64;

/// Serve control messages over stdin/stdout
///
/// Returns when stdin is closed and every in-flight request has replied.
#[instrument(skip(coordinator))]
pub async fn run_bridge_stdio(coordinator: Arc<ModelLifecycleCoordinator>) -> anyhow::Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    run_bridge_server(coordinator, reader, tokio::io::stdout()).await
}

/// Serve control messages from `reader`, writing replies to `writer`
///
/// # Returns
///
/// Returns Ok(()) on EOF after all in-flight requests have been answered, or
/// Err if reading input or writing a reply fails.
#[instrument(skip(coordinator, reader, writer))]
pub async fn run_bridge_server<R, W>(
    coordinator: Arc<ModelLifecycleCoordinator>,
    reader: R,
    writer: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    info!("🔌 Bridge server started");

    let (tx, rx) = mpsc::channel::<BridgeResponse>(RESPONSE_QUEUE_SIZE);
    let writer_task = tokio::spawn(write_responses(writer, rx));

    let mut in_flight = JoinSet::new();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("📥 Control message: {}", line);

        let coordinator = Arc::clone(&coordinator);
        let tx = tx.clone();
        in_flight.spawn(async move {
            let response = handle_line(&coordinator, &line).await;
            if tx.send(response).await.is_err() {
                error!("❌ Reply dropped, writer has stopped");
            }
        });

        // Reap finished handlers so the set does not grow unbounded
        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}
    drop(tx);

    writer_task.await??;
    info!("🔌 Bridge server stopped (input closed)");
    Ok(())
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::Receiver<BridgeResponse>) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        debug!(
            "📤 Reply (requestId={:?}, success={})",
            response.request_id, response.success
        );
        let json = serde_json::to_string(&response)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
