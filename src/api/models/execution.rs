//! Execution API models and DTOs

use serde::{Deserialize, Serialize};

use crate::orchestration::types::{CancelResult, TriggerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub execution_id: String,
    pub pending_nodes: i64,
    pub pending_nodes_ids: Vec<String>,
    pub started_at: String,
}

impl From<TriggerResult> for TriggerResponse {
    fn from(result: TriggerResult) -> Self {
        Self {
            execution_id: result.execution_id,
            pending_nodes: result.pending_nodes,
            pending_nodes_ids: result.pending_nodes_ids,
            started_at: result.started_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub execution_id: String,
    pub pending_nodes: i64,
    pub executed_nodes: i64,
    pub results: serde_json::Value,
    pub started_at: String,
}

impl From<CancelResult> for CancelResponse {
    fn from(result: CancelResult) -> Self {
        Self {
            execution_id: result.execution_id,
            pending_nodes: result.pending_nodes,
            executed_nodes: result.executed_nodes,
            results: result.results,
            started_at: result.started_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub id: String,
    pub workflow_id: String,
    pub status: String,
    pub pending_count: i64,
    pub executed_count: i64,
    pub results: Option<serde_json::Value>,
    pub started_at: String,
    pub ended_at: Option<String>,
}

impl From<crate::db::models::Execution> for ExecutionResponse {
    fn from(e: crate::db::models::Execution) -> Self {
        Self {
            id: e.id,
            workflow_id: e.workflow_id,
            status: e.status,
            pending_count: e.pending_count,
            executed_count: e.executed_count,
            results: e.results.as_deref().and_then(|s| serde_json::from_str(s).ok()),
            started_at: e.started_at,
            ended_at: e.ended_at,
        }
    }
}
