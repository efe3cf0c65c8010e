//! A single supervised worker process: spawns the `flowctl-worker` binary,
//! feeds it commands on stdin, and demultiplexes its tagged stdout stream
//! into health replies and task outputs.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use super::protocol::{HealthMessage, TaskOutput, WorkerCommand, WorkerMessage};
use super::queue::BoundedQueue;

/// Lowest (i.e. most favorable) nice value this process is typically allowed
/// to set without elevated privileges is 0, but we still attempt a negative
/// value; failure is logged and ignored.
#[cfg(unix)]
const RENICE_TARGET: i32 = -5;

/// Grace period given to a worker process to drain in-flight task threads
/// after a `shutdown` command before it's force-killed. Matches the
/// `SHUTDOWN_GRACE` the worker binary itself waits on its own drain loop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct Worker {
    pub index: usize,
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    thread_count: AtomicUsize,
    alive: AtomicBool,
    health_waiters: Mutex<Vec<oneshot::Sender<usize>>>,
}

impl Worker {
    /// Spawns the worker binary (resolved as a sibling of the running
    /// executable, named `flowctl-worker`) and starts its stdout reader.
    pub async fn spawn(
        index: usize,
        worker_binary: &std::path::Path,
        output_queue: Arc<BoundedQueue<TaskOutput>>,
    ) -> std::io::Result<Arc<Self>> {
        let mut child = tokio::process::Command::new(worker_binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let pid = child.id();
        let stdin = child.stdin.take().expect("stdin piped");
        let stdout = child.stdout.take().expect("stdout piped");

        if let Some(pid) = pid {
            renice(pid);
        }

        let worker = Arc::new(Self {
            index,
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            thread_count: AtomicUsize::new(0),
            alive: AtomicBool::new(true),
            health_waiters: Mutex::new(Vec::new()),
        });

        let reader_worker = worker.clone();
        tokio::spawn(async move {
            reader_worker.read_loop(stdout, output_queue).await;
        });

        Ok(worker)
    }

    async fn read_loop(
        self: Arc<Self>,
        stdout: tokio::process::ChildStdout,
        output_queue: Arc<BoundedQueue<TaskOutput>>,
    ) {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match serde_json::from_str::<WorkerMessage>(&line) {
                    Ok(WorkerMessage::Output(output)) => {
                        if output_queue.put_nowait(output).is_err() {
                            warn!(worker = self.index, "output queue full, dropping result");
                        }
                    }
                    Ok(WorkerMessage::Health(HealthMessage::ThreadCountReply { count })) => {
                        self.thread_count.store(count, Ordering::Relaxed);
                        let mut waiters = self.health_waiters.lock().await;
                        for tx in waiters.drain(..) {
                            let _ = tx.send(count);
                        }
                    }
                    Ok(WorkerMessage::Health(HealthMessage::Heartbeat)) => {
                        debug!(worker = self.index, "heartbeat");
                    }
                    Err(e) => warn!(worker = self.index, error = %e, "malformed worker frame"),
                },
                Ok(None) => {
                    debug!(worker = self.index, "worker stdout closed");
                    break;
                }
                Err(e) => {
                    warn!(worker = self.index, error = %e, "error reading worker stdout");
                    break;
                }
            }
        }
        self.alive.store(false, Ordering::Relaxed);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count.load(Ordering::Relaxed)
    }

    async fn send_command(&self, command: &WorkerCommand) -> std::io::Result<()> {
        let mut line = serde_json::to_string(command).expect("command always serializes");
        line.push('\n');
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await
    }

    pub async fn submit(&self, payload: super::protocol::TaskPayload) -> std::io::Result<()> {
        self.send_command(&WorkerCommand::Submit(payload)).await
    }

    /// Requests a thread-count reply and waits up to `timeout` for it.
    pub async fn query_thread_count(&self, timeout: Duration) -> Option<usize> {
        let (tx, rx) = oneshot::channel();
        self.health_waiters.lock().await.push(tx);
        if self.send_command(&WorkerCommand::ThreadCountQuery).await.is_err() {
            return None;
        }
        tokio::time::timeout(timeout, rx).await.ok()?.ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.send_command(&WorkerCommand::Shutdown).await;
        let mut child = self.child.lock().await;
        if tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await.is_err() {
            let _ = child.kill().await;
        }
        self.alive.store(false, Ordering::Relaxed);
    }
}

#[cfg(unix)]
fn renice(pid: u32) {
    use nix::sys::resource::{setpriority, PriorityWhich};
    use nix::unistd::Pid;

    if let Err(e) = setpriority(PriorityWhich::Process(Pid::from_raw(pid as i32)), RENICE_TARGET) {
        debug!(pid, error = %e, "renice failed, continuing at default priority");
    }
}

#[cfg(not(unix))]
fn renice(_pid: u32) {}
