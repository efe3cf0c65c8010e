//! Execution model: a single triggered run of a workflow.
//!
//! Adopts the "counter variant" of the data model: `pending_count` and
//! `executed_count` live directly on the execution row rather than being
//! derived from a separate results table.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Execution {
    pub id: String,
    pub workflow_id: String,
    /// pending, running, completed, failed, cancelled
    pub status: String,
    pub pending_count: i64,
    pub executed_count: i64,
    /// Aggregated per-node result JSON, populated at finalization.
    pub results: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
}

impl Execution {
    pub fn new(id: String, workflow_id: String, total_nodes: i64) -> Self {
        Self {
            id,
            workflow_id,
            status: "pending".to_string(),
            pending_count: total_nodes,
            executed_count: 0,
            results: None,
            started_at: chrono::Utc::now().to_rfc3339(),
            ended_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "failed" | "cancelled")
    }
}
