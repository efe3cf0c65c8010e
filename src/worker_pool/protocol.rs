//! Wire messages exchanged with `flowctl-worker` child processes.
//!
//! The source design gives each worker two duplex `multiprocessing.Pipe()`
//! pairs (command, health). A child process only exposes one stdin/stdout
//! pair, so both are multiplexed here as newline-delimited JSON frames
//! tagged by a `channel` discriminant: commands go out over stdin untagged
//! (the worker only ever receives commands on that pipe), while stdout
//! carries both health replies and task outputs, distinguished by `channel`.

use serde::{Deserialize, Serialize};

/// A task ready for execution, with its parameter context already resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPayload {
    pub task_id: String,
    pub execution_id: String,
    pub workflow_id: String,
    pub node_id: String,
    pub node_name: String,
    pub node_type: String,
    pub script_path: String,
    pub resolved_context: serde_json::Value,
}

/// Sent from the supervisor to a worker's stdin, one JSON object per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerCommand {
    Submit(TaskPayload),
    ThreadCountQuery,
    Shutdown,
}

/// Sent from a worker's stdout back to the supervisor, one JSON object per
/// line, tagged by which logical channel it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum WorkerMessage {
    Health(HealthMessage),
    Output(TaskOutput),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthMessage {
    ThreadCountReply { count: usize },
    Heartbeat,
}

/// Result of running a task's script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task_id: String,
    pub execution_id: String,
    pub node_id: String,
    pub status: TaskStatus,
    pub result_data: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
        }
    }
}
