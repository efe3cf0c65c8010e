//! Node model: an executable unit within a workflow's DAG.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Node {
    pub id: String,
    pub workflow_id: String,
    pub name: String,
    pub node_type: String,
    pub script_id: String,
    /// JSON object of static + templated parameter values.
    pub params: String,
    pub max_retries: i64,
    pub timeout_seconds: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Node {
    pub fn new(
        id: String,
        workflow_id: String,
        name: String,
        node_type: String,
        script_id: String,
        params: String,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            workflow_id,
            name,
            node_type,
            script_id,
            params,
            max_retries: 0,
            timeout_seconds: 300,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn parsed_params(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.params)
    }

    pub fn with_retries_and_timeout(mut self, max_retries: i64, timeout_seconds: i64) -> Self {
        self.max_retries = max_retries;
        self.timeout_seconds = timeout_seconds;
        self
    }
}
