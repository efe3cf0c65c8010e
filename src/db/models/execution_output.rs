//! ExecutionOutput model: the terminal record of one node's run within an
//! execution. Exactly one row exists per (execution_id, node_id) once that
//! node reaches a terminal state.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutionOutput {
    pub id: String,
    pub execution_id: String,
    pub node_id: String,
    /// success, failed, cancelled, timeout
    pub status: String,
    pub result_data: Option<String>,
    pub error_message: Option<String>,
    pub started_at: String,
    pub ended_at: String,
}

impl ExecutionOutput {
    pub fn success(
        id: String,
        execution_id: String,
        node_id: String,
        result_data: String,
        started_at: String,
    ) -> Self {
        Self {
            id,
            execution_id,
            node_id,
            status: "success".to_string(),
            result_data: Some(result_data),
            error_message: None,
            started_at,
            ended_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn failed(
        id: String,
        execution_id: String,
        node_id: String,
        error_message: String,
        started_at: String,
    ) -> Self {
        Self {
            id,
            execution_id,
            node_id,
            status: "failed".to_string(),
            result_data: None,
            error_message: Some(error_message),
            started_at,
            ended_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
