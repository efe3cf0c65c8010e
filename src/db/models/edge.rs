//! Edge model: a directed dependency between two nodes in the same workflow.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Edge {
    pub id: String,
    pub workflow_id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    /// success, failure, always
    pub condition_type: String,
    pub created_at: String,
}

impl Edge {
    pub fn new(
        id: String,
        workflow_id: String,
        from_node_id: String,
        to_node_id: String,
        condition_type: String,
    ) -> Self {
        Self {
            id,
            workflow_id,
            from_node_id,
            to_node_id,
            condition_type,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
