//! Child-process compute context
//!
//! Spawns the compute worker as a separate OS process and talks to it with
//! newline-delimited JSON:
//!
//! - stdin: one `RequestEnvelope` per line
//! - stdout: `ReplyEnvelope` lines (routed to the waiting caller by id) and
//!   `UPDATE_MODEL_STATUS` pushes (forwarded to an optional status sender)
//!
//! Output is handled strictly in order. A push is acknowledged by its
//! receiver before the next line is read, so by the time a caller sees its
//! reply every push the worker sent ahead of it has been applied.
//! - stderr: inherited, so worker logs land next to the host's
//!
//! When the worker exits, every outstanding request fails with
//! `ChannelError::Closed` and the next `ensure_ready` spawns a fresh worker.

use super::messages::{ComputeReply, ComputeRequest, RequestEnvelope, WorkerMessage};
use super::{ChannelError, ComputeContextManager, ContextError, MessageChannel};
use crate::models::ModelState;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

type ReplySender = oneshot::Sender<Result<ComputeReply, ChannelError>>;

/// A status record pushed by the worker
///
/// The receiver must call `ack` once the state has been applied; worker
/// output is held until then. Dropping the push unacknowledged releases it
/// as well.
#[derive(Debug)]
pub struct StatusPush {
    pub state: ModelState,
    ack: oneshot::Sender<()>,
}

impl StatusPush {
    pub fn new(state: ModelState) -> (Self, oneshot::Receiver<()>) {
        let (ack, done) = oneshot::channel();
        (Self { state, ack }, done)
    }

    pub fn ack(self) {
        let _ = self.ack.send(());
    }
}

type PendingReplies = Arc<std::sync::Mutex<HashMap<u64, ReplySender>>>;

/// A running worker and the bookkeeping tied to its lifetime
struct Worker {
    child: Child,
    stdin: ChildStdin,
    pending: PendingReplies,
    alive: Arc<AtomicBool>,
}

impl Worker {
    fn is_alive(&mut self) -> bool {
        self.alive.load(Ordering::SeqCst) && matches!(self.child.try_wait(), Ok(None))
    }
}

/// Removes a pending entry when the caller stops waiting (reply, error, or
/// the caller's future being dropped by a timeout)
struct PendingGuard {
    id: u64,
    pending: PendingReplies,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Ok(mut map) = self.pending.lock() {
            map.remove(&self.id);
        }
    }
}

/// Compute context backed by a child process
pub struct ProcessComputeContext {
    program: PathBuf,
    args: Vec<String>,
    worker: Mutex<Option<Worker>>,
    next_id: AtomicU64,
    status_tx: Option<mpsc::Sender<StatusPush>>,
}

impl ProcessComputeContext {
    /// Create a context that runs `program` on first `ensure_ready`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            worker: Mutex::new(None),
            next_id: AtomicU64::new(1),
            status_tx: None,
        }
    }

    /// Extra command-line arguments for the worker
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Forward `UPDATE_MODEL_STATUS` pushes from the worker to `tx`
    ///
    /// Each push must be acknowledged (see `StatusPush::ack`). Without a
    /// sender, pushes are logged and dropped.
    pub fn with_status_sender(mut self, tx: mpsc::Sender<StatusPush>) -> Self {
        self.status_tx = Some(tx);
        self
    }

    /// Whether a live worker process is attached
    pub async fn is_running(&self) -> bool {
        match self.worker.lock().await.as_mut() {
            Some(worker) => worker.is_alive(),
            None => false,
        }
    }

    /// Stop the worker, failing any outstanding requests
    pub async fn shutdown(&self) {
        let Some(worker) = self.worker.lock().await.take() else {
            return;
        };

        let Worker {
            mut child, stdin, ..
        } = worker;
        drop(stdin);

        if let Err(e) = child.kill().await {
            warn!("Failed to stop compute context: {}", e);
        } else {
            info!("Compute context stopped");
        }
    }

    fn spawn_worker(&self) -> Result<Worker, ContextError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ContextError::spawn_failed(format!("{}: {}", self.program.display(), e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ContextError::not_ready("worker stdin is not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ContextError::not_ready("worker stdout is not piped"))?;

        let pending: PendingReplies = Arc::new(std::sync::Mutex::new(HashMap::new()));
        let alive = Arc::new(AtomicBool::new(true));

        tokio::spawn(read_worker_output(
            stdout,
            Arc::clone(&pending),
            Arc::clone(&alive),
            self.status_tx.clone(),
        ));

        Ok(Worker {
            child,
            stdin,
            pending,
            alive,
        })
    }
}

#[async_trait]
impl ComputeContextManager for ProcessComputeContext {
    async fn ensure_ready(&self) -> Result<(), ContextError> {
        let mut slot = self.worker.lock().await;

        if let Some(worker) = slot.as_mut() {
            if worker.is_alive() {
                return Ok(());
            }
            warn!("Compute context exited, restarting");
            let _ = worker.child.start_kill();
        }

        info!("Starting compute context: {}", self.program.display());
        *slot = Some(self.spawn_worker()?);
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for ProcessComputeContext {
    async fn send(&self, request: ComputeRequest) -> Result<ComputeReply, ChannelError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();

        // Writes are serialized by the worker lock; the reply wait is not.
        let _guard = {
            let mut slot = self.worker.lock().await;
            let worker = slot
                .as_mut()
                .filter(|worker| worker.alive.load(Ordering::SeqCst))
                .ok_or(ChannelError::Closed)?;

            {
                let mut pending = worker
                    .pending
                    .lock()
                    .map_err(|_| ChannelError::send_failed("pending reply table poisoned"))?;
                // The reader marks the worker dead before clearing this table
                if !worker.alive.load(Ordering::SeqCst) {
                    return Err(ChannelError::Closed);
                }
                pending.insert(id, tx);
            }
            let guard = PendingGuard {
                id,
                pending: Arc::clone(&worker.pending),
            };

            let mut line = serde_json::to_string(&RequestEnvelope { id, request })
                .map_err(|e| ChannelError::send_failed(e.to_string()))?;
            line.push('\n');

            worker
                .stdin
                .write_all(line.as_bytes())
                .await
                .map_err(|e| ChannelError::send_failed(e.to_string()))?;
            worker
                .stdin
                .flush()
                .await
                .map_err(|e| ChannelError::send_failed(e.to_string()))?;

            guard
        };

        debug!("Request {} sent to compute context", id);
        rx.await.map_err(|_| ChannelError::Closed)?
    }
}

/// Route worker output until the stream closes
async fn read_worker_output(
    stdout: ChildStdout,
    pending: PendingReplies,
    alive: Arc<AtomicBool>,
    status_tx: Option<mpsc::Sender<StatusPush>>,
) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read compute context output: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkerMessage>(&line) {
            Ok(WorkerMessage::Reply(envelope)) => {
                deliver(&pending, envelope.reply_to, Ok(envelope.reply));
            }
            Ok(WorkerMessage::StatusUpdate(update)) => match &status_tx {
                Some(tx) => {
                    let (push, applied) = StatusPush::new(update.model_state);
                    if tx.send(push).await.is_err() {
                        debug!("Status receiver dropped, discarding compute context push");
                        continue;
                    }
                    // Hold later output (including replies) until the push is applied
                    let _ = applied.await;
                }
                None => debug!("No status receiver, discarding compute context push"),
            },
            Err(e) => match reply_id(&line) {
                // Addressed to a caller but unreadable: fail that caller
                Some(id) => deliver(&pending, id, Err(ChannelError::malformed(e.to_string()))),
                None => warn!("Ignoring unrecognised compute context output: {}", e),
            },
        }
    }

    alive.store(false, Ordering::SeqCst);
    if let Ok(mut map) = pending.lock() {
        if !map.is_empty() {
            warn!(
                "Compute context closed with {} request(s) outstanding",
                map.len()
            );
        }
        map.clear();
    }
    info!("Compute context output closed");
}

fn deliver(pending: &PendingReplies, id: u64, result: Result<ComputeReply, ChannelError>) {
    let sender = pending.lock().ok().and_then(|mut map| map.remove(&id));
    match sender {
        Some(tx) => {
            let _ = tx.send(result);
        }
        None => warn!("Reply for unknown or abandoned request {}", id),
    }
}

fn reply_id(line: &str) -> Option<u64> {
    serde_json::from_str::<Value>(line)
        .ok()?
        .get("replyTo")?
        .as_u64()
}
