//! Workflow API models and DTOs

use serde::{Deserialize, Serialize};

use crate::orchestration::types::{CreateWorkflowResult, EdgeSpec, NodeSpec, TriggerSpec, WorkflowSpec};

/// Body of `POST /workflows/create` and `PUT /workflows/update/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: i64,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
}

impl From<WorkflowRequest> for WorkflowSpec {
    fn from(req: WorkflowRequest) -> Self {
        WorkflowSpec {
            name: req.name,
            description: req.description,
            priority: req.priority,
            nodes: req.nodes,
            edges: req.edges,
            triggers: req.triggers,
        }
    }
}

/// Response to a successful workflow create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowCreatedResponse {
    pub workflow_id: String,
    pub nodes: usize,
    pub edges: usize,
    pub triggers: usize,
    pub created_at: String,
}

impl From<CreateWorkflowResult> for WorkflowCreatedResponse {
    fn from(result: CreateWorkflowResult) -> Self {
        Self {
            workflow_id: result.workflow_id,
            nodes: result.nodes,
            edges: result.edges,
            triggers: result.triggers,
            created_at: result.created_at,
        }
    }
}

/// `GET /workflows/{id}` and list-item shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::db::models::Workflow> for WorkflowResponse {
    fn from(w: crate::db::models::Workflow) -> Self {
        Self {
            id: w.id,
            name: w.name,
            description: w.description,
            status: w.status,
            priority: w.priority,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}
