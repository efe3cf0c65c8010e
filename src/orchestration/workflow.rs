//! Workflow CRUD: validated, audit-logged composition over the store.

use chrono::Utc;
use uuid::Uuid;

use crate::db::connection::DatabasePool;
use crate::db::models::{Edge, Node, Trigger, Workflow};
use crate::db::repositories::{EdgeRepository, NodeRepository, ScriptRepository, TriggerRepository, WorkflowRepository};
use crate::orchestration::audit;
use crate::orchestration::types::{CreateWorkflowResult, WorkflowSpec};
use crate::{Error, Result};

/// Persists a workflow's nodes, edges, and triggers. Edge endpoints and node
/// script references are resolved to ids and validated before anything is
/// written.
pub async fn create_workflow(pool: &DatabasePool, spec: WorkflowSpec) -> Result<CreateWorkflowResult> {
    if spec.name.trim().is_empty() {
        return Err(Error::Validation("workflow name cannot be empty".to_string()));
    }
    if WorkflowRepository::find_by_name(pool, &spec.name)
        .await
        .map_err(crate::db::DatabaseError::from)?
        .is_some()
    {
        return Err(Error::Validation(format!("workflow name already in use: {}", spec.name)));
    }

    let mut node_names = std::collections::HashSet::new();
    for node in &spec.nodes {
        if !node_names.insert(node.name.clone()) {
            return Err(Error::Validation(format!("duplicate node name: {}", node.name)));
        }
    }
    for edge in &spec.edges {
        if !node_names.contains(&edge.from_node) || !node_names.contains(&edge.to_node) {
            return Err(Error::BusinessLogic(format!(
                "edge endpoints must reference nodes in the same workflow: {} -> {}",
                edge.from_node, edge.to_node
            )));
        }
        if edge.from_node == edge.to_node {
            return Err(Error::Validation(format!("self-loop edge rejected: {}", edge.from_node)));
        }
    }

    let workflow_id = Uuid::new_v4().to_string();
    let workflow = WorkflowRepository::create(
        pool,
        &workflow_id,
        &spec.name,
        spec.description.as_deref(),
        spec.priority,
    )
    .await
    .map_err(crate::db::DatabaseError::from)?;

    let mut name_to_id = std::collections::HashMap::new();
    for node_spec in &spec.nodes {
        let script = ScriptRepository::find_by_name(pool, &node_spec.script_name)
            .await
            .map_err(crate::db::DatabaseError::from)?
            .ok_or_else(|| Error::BusinessLogic(format!("script not found: {}", node_spec.script_name)))?;

        let node = Node::new(
            Uuid::new_v4().to_string(),
            workflow_id.clone(),
            node_spec.name.clone(),
            node_spec.node_type.clone(),
            script.id,
            node_spec.params.to_string(),
        )
        .with_retries_and_timeout(node_spec.max_retries, node_spec.timeout_seconds);

        name_to_id.insert(node_spec.name.clone(), node.id.clone());
        NodeRepository::create(pool, &node).await.map_err(crate::db::DatabaseError::from)?;
    }

    for edge_spec in &spec.edges {
        let from_id = name_to_id.get(&edge_spec.from_node).expect("validated above");
        let to_id = name_to_id.get(&edge_spec.to_node).expect("validated above");
        let edge = Edge::new(
            Uuid::new_v4().to_string(),
            workflow_id.clone(),
            from_id.clone(),
            to_id.clone(),
            edge_spec.condition_type.clone(),
        );
        EdgeRepository::create(pool, &edge).await.map_err(crate::db::DatabaseError::from)?;
    }

    for trigger_spec in &spec.triggers {
        let mut trigger = Trigger::new(
            Uuid::new_v4().to_string(),
            workflow_id.clone(),
            trigger_spec.trigger_type.clone(),
            trigger_spec.config.to_string(),
        );
        trigger.is_active = trigger_spec.is_active;
        TriggerRepository::create(pool, &trigger).await.map_err(crate::db::DatabaseError::from)?;
    }

    audit::record(
        pool,
        "workflows",
        &workflow_id,
        "create",
        None,
        Some(serde_json::json!({"name": spec.name, "node_count": spec.nodes.len()})),
    )
    .await
    .map_err(crate::db::DatabaseError::from)?;

    Ok(CreateWorkflowResult {
        workflow_id,
        nodes: spec.nodes.len(),
        edges: spec.edges.len(),
        triggers: spec.triggers.len(),
        created_at: workflow.created_at,
    })
}

/// Delete-then-recreate: the old structure is torn down and a new one issued
/// under a fresh id. Rejected while any execution is active.
pub async fn update_workflow(pool: &DatabasePool, id: &str, spec: WorkflowSpec) -> Result<CreateWorkflowResult> {
    let existing = WorkflowRepository::get_by_id(pool, id)
        .await
        .map_err(crate::db::DatabaseError::from)?
        .ok_or_else(|| Error::Resource(format!("workflow not found: {}", id)))?;

    if WorkflowRepository::has_active_executions(pool, id)
        .await
        .map_err(crate::db::DatabaseError::from)?
    {
        return Err(Error::BusinessLogic(format!(
            "cannot update workflow {} while executions are active",
            id
        )));
    }

    delete_workflow(pool, id).await?;
    let result = create_workflow(pool, spec).await?;

    audit::record(
        pool,
        "workflows",
        &result.workflow_id,
        "update",
        Some(serde_json::json!({"previous_id": existing.id})),
        Some(serde_json::json!({"new_id": result.workflow_id})),
    )
    .await
    .map_err(crate::db::DatabaseError::from)?;

    Ok(result)
}

/// Rejects if active executions exist; cascades to triggers, edges, nodes
/// (enforced by the schema's `ON DELETE CASCADE` foreign keys).
pub async fn delete_workflow(pool: &DatabasePool, id: &str) -> Result<()> {
    let workflow = WorkflowRepository::get_by_id(pool, id)
        .await
        .map_err(crate::db::DatabaseError::from)?
        .ok_or_else(|| Error::Resource(format!("workflow not found: {}", id)))?;

    if WorkflowRepository::has_active_executions(pool, id)
        .await
        .map_err(crate::db::DatabaseError::from)?
    {
        return Err(Error::BusinessLogic(format!(
            "cannot delete workflow {} while executions are active",
            id
        )));
    }

    WorkflowRepository::delete(pool, id).await.map_err(crate::db::DatabaseError::from)?;

    audit::record(
        pool,
        "workflows",
        id,
        "delete",
        Some(serde_json::to_value(&workflow).unwrap_or_default()),
        None,
    )
    .await
    .map_err(crate::db::DatabaseError::from)?;

    Ok(())
}

pub async fn list_workflows(pool: &DatabasePool) -> Result<Vec<Workflow>> {
    Ok(WorkflowRepository::list(pool).await.map_err(crate::db::DatabaseError::from)?)
}

pub async fn get_workflow(pool: &DatabasePool, id: &str) -> Result<Workflow> {
    WorkflowRepository::get_by_id(pool, id)
        .await
        .map_err(crate::db::DatabaseError::from)?
        .ok_or_else(|| Error::Resource(format!("workflow not found: {}", id)))
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}
