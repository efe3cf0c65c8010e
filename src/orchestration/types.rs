//! Request/response shapes for the orchestration layer.
//!
//! These are the in-process equivalent of the workflow JSON described in the
//! external HTTP contract; the API layer deserializes directly into these
//! where the shapes line up, and maps otherwise.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub script_name: String,
    #[serde(default = "default_params")]
    pub params: serde_json::Value,
    #[serde(default)]
    pub max_retries: i64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: i64,
}

fn default_params() -> serde_json::Value {
    serde_json::json!({})
}

fn default_timeout() -> i64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from_node: String,
    pub to_node: String,
    #[serde(default = "default_condition")]
    pub condition_type: String,
}

fn default_condition() -> String {
    "always".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub trigger_type: String,
    #[serde(default = "default_trigger_config")]
    pub config: serde_json::Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_trigger_config() -> serde_json::Value {
    serde_json::json!({})
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWorkflowResult {
    pub workflow_id: String,
    pub nodes: usize,
    pub edges: usize,
    pub triggers: usize,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerResult {
    pub execution_id: String,
    pub pending_nodes: i64,
    pub pending_nodes_ids: Vec<String>,
    pub started_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelResult {
    pub execution_id: String,
    pub pending_nodes: i64,
    pub executed_nodes: i64,
    pub results: serde_json::Value,
    pub started_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptCreateResult {
    pub script_id: String,
    pub absolute_path: String,
    pub created_at: String,
}
