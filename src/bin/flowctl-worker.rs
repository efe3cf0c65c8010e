//! flowctl-worker: the child process side of the worker pool protocol.
//!
//! A single-threaded controller loop reads `WorkerCommand`s from stdin.
//! `Submit` launches an independent OS thread per task; each thread invokes
//! the task's script as its own subprocess (the script's shebang selects the
//! language runtime), feeding it the resolved context on stdin and parsing
//! its stdout as the JSON-encoded result, then writes a tagged
//! `WorkerMessage` line back on stdout. `ThreadCountQuery` and a periodic
//! heartbeat go out over the same stdout, tagged as `health`.

use std::io::{BufRead, Write};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flowctl::worker_pool::protocol::{HealthMessage, TaskOutput, TaskPayload, TaskStatus, WorkerCommand, WorkerMessage};

/// Grace period the controller loop waits for in-flight task threads after a
/// `shutdown` command before the process exits anyway.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

struct WorkerState {
    active_threads: AtomicUsize,
    shutting_down: AtomicBool,
    stdout: Mutex<std::io::Stdout>,
}

impl WorkerState {
    fn send(&self, message: &WorkerMessage) {
        let line = match serde_json::to_string(message) {
            Ok(line) => line,
            Err(e) => {
                eprintln!("failed to encode worker message: {e}");
                return;
            }
        };
        let mut out = self.stdout.lock().unwrap();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

fn main() {
    let rust_log = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).with_writer(std::io::stderr).init();

    let state = Arc::new(WorkerState {
        active_threads: AtomicUsize::new(0),
        shutting_down: AtomicBool::new(false),
        stdout: Mutex::new(std::io::stdout()),
    });

    spawn_heartbeat(state.clone());

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) if !line.trim().is_empty() => line,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read command line, exiting");
                break;
            }
        };

        let command: WorkerCommand = match serde_json::from_str(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse worker command, ignoring");
                continue;
            }
        };

        match command {
            WorkerCommand::Submit(payload) => dispatch_task(&state, payload),
            WorkerCommand::ThreadCountQuery => {
                let count = state.active_threads.load(Ordering::SeqCst);
                state.send(&WorkerMessage::Health(HealthMessage::ThreadCountReply { count }));
            }
            WorkerCommand::Shutdown => {
                state.shutting_down.store(true, Ordering::SeqCst);
                break;
            }
        }
    }

    wait_for_drain(&state);
}

fn spawn_heartbeat(state: Arc<WorkerState>) {
    std::thread::spawn(move || loop {
        std::thread::sleep(HEARTBEAT_INTERVAL);
        if state.shutting_down.load(Ordering::SeqCst) {
            return;
        }
        state.send(&WorkerMessage::Health(HealthMessage::Heartbeat));
    });
}

fn wait_for_drain(state: &WorkerState) {
    let start = std::time::Instant::now();
    while state.active_threads.load(Ordering::SeqCst) > 0 {
        if start.elapsed() > SHUTDOWN_GRACE {
            tracing::warn!("in-flight tasks did not drain within grace period, exiting anyway");
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// Launches one OS thread per submitted task: one running task occupies
/// one thread for its lifetime inside this worker process.
fn dispatch_task(state: &Arc<WorkerState>, payload: TaskPayload) {
    state.active_threads.fetch_add(1, Ordering::SeqCst);
    let state = state.clone();
    std::thread::spawn(move || {
        let output = run_script(&payload);
        state.send(&WorkerMessage::Output(output));
        state.active_threads.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Realizes the `module()`/`run(context)` reflection contract as a subprocess
/// boundary: the script file is invoked directly, the resolved context goes
/// in on stdin as JSON, and stdout is parsed as the JSON-encoded result
/// string.
fn run_script(payload: &TaskPayload) -> TaskOutput {
    let base = |status: TaskStatus, result_data: Option<String>, error_message: Option<String>| TaskOutput {
        task_id: payload.task_id.clone(),
        execution_id: payload.execution_id.clone(),
        node_id: payload.node_id.clone(),
        status,
        result_data,
        error_message,
    };

    if !std::path::Path::new(&payload.script_path).exists() {
        return base(TaskStatus::Failed, None, Some("Script file not found".to_string()));
    }

    let mut child = match std::process::Command::new(&payload.script_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return base(TaskStatus::Failed, None, Some(format!("Import error: {e}"))),
    };

    if let Some(mut stdin) = child.stdin.take() {
        let context = payload.resolved_context.to_string();
        if let Err(e) = stdin.write_all(context.as_bytes()) {
            return base(TaskStatus::Failed, None, Some(format!("Value error: {e}")));
        }
    }

    let output = match child.wait_with_output() {
        Ok(output) => output,
        Err(e) => return base(TaskStatus::Failed, None, Some(format!("Unexpected error: {e}"))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return base(
            TaskStatus::Failed,
            None,
            Some(format!("Unexpected error: script exited with {}: {}", output.status, stderr.trim())),
        );
    }

    let stdout = match String::from_utf8(output.stdout) {
        Ok(s) => s,
        Err(e) => return base(TaskStatus::Failed, None, Some(format!("Unexpected error: {e}"))),
    };
    let trimmed = stdout.trim();

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(_) => base(TaskStatus::Success, Some(trimmed.to_string()), None),
        Err(e) => base(TaskStatus::Failed, None, Some(format!("JSON error: {e}"))),
    }
}
