//! Task (queue row) model: a node awaiting or in flight for one execution.
//!
//! Rows are deleted once the input monitor hands the corresponding task to
//! a worker; the task's outcome then lives in `execution_outputs` instead.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub execution_id: String,
    pub node_id: String,
    /// pending, ready, running, cancelled
    pub status: String,
    pub priority: i64,
    pub dependency_count: i64,
    pub created_at: String,
}

impl Task {
    pub fn new(
        id: String,
        execution_id: String,
        node_id: String,
        priority: i64,
        dependency_count: i64,
    ) -> Self {
        Self {
            id,
            execution_id,
            node_id,
            status: if dependency_count == 0 { "ready" } else { "pending" }.to_string(),
            priority,
            dependency_count,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready" && self.dependency_count == 0
    }
}
