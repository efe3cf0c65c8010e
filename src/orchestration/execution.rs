//! trigger_workflow / cancel_execution: the entry points to the scheduling
//! pipeline.

use uuid::Uuid;

use crate::db::connection::DatabasePool;
use crate::db::models::{Execution, Task};
use crate::db::repositories::{
    ExecutionOutputRepository, ExecutionRepository, NodeRepository, TaskRepository,
    WorkflowRepository,
};
use crate::orchestration::audit;
use crate::orchestration::types::{CancelResult, TriggerResult};
use crate::{Error, Result};

/// Resolves the workflow, seeds dependency counts from incoming edges,
/// creates the Execution row, and inserts one Task per node.
pub async fn trigger_workflow(pool: &DatabasePool, workflow_id: &str) -> Result<TriggerResult> {
    let workflow = WorkflowRepository::get_by_id(pool, workflow_id)
        .await
        .map_err(crate::db::DatabaseError::from)?
        .ok_or_else(|| Error::Resource(format!("workflow not found: {}", workflow_id)))?;

    let nodes = NodeRepository::list_by_workflow(pool, workflow_id)
        .await
        .map_err(crate::db::DatabaseError::from)?;
    if nodes.is_empty() {
        return Err(Error::BusinessLogic(format!("workflow {} has no nodes", workflow_id)));
    }

    let execution_id = Uuid::new_v4().to_string();
    let execution = Execution::new(execution_id.clone(), workflow_id.to_string(), nodes.len() as i64);
    ExecutionRepository::create(pool, &execution)
        .await
        .map_err(crate::db::DatabaseError::from)?;

    let mut task_ids = Vec::with_capacity(nodes.len());
    for node in &nodes {
        let dependency_count = NodeRepository::incoming_edge_count(pool, &node.id)
            .await
            .map_err(crate::db::DatabaseError::from)?;
        let task = Task::new(
            Uuid::new_v4().to_string(),
            execution_id.clone(),
            node.id.clone(),
            workflow.priority,
            dependency_count,
        );
        task_ids.push(task.id.clone());
        TaskRepository::create(pool, &task).await.map_err(crate::db::DatabaseError::from)?;
    }

    audit::record(
        pool,
        "executions",
        &execution_id,
        "create",
        None,
        Some(serde_json::json!({"workflow_id": workflow_id, "node_count": nodes.len()})),
    )
    .await
    .map_err(crate::db::DatabaseError::from)?;

    Ok(TriggerResult {
        execution_id,
        pending_nodes: nodes.len() as i64,
        pending_nodes_ids: task_ids,
        started_at: execution.started_at,
    })
}

/// Deletes all queue rows for the execution, synthesizes `cancelled` entries
/// for any node lacking a real output, and marks the execution cancelled.
pub async fn cancel_execution(pool: &DatabasePool, execution_id: &str) -> Result<CancelResult> {
    let execution = ExecutionRepository::get_by_id(pool, execution_id)
        .await
        .map_err(crate::db::DatabaseError::from)?
        .ok_or_else(|| Error::Resource(format!("execution not found: {}", execution_id)))?;

    let nodes = NodeRepository::list_by_workflow(pool, &execution.workflow_id)
        .await
        .map_err(crate::db::DatabaseError::from)?;
    let outputs = ExecutionOutputRepository::list_for_execution(pool, execution_id)
        .await
        .map_err(crate::db::DatabaseError::from)?;
    let completed: std::collections::HashMap<_, _> =
        outputs.into_iter().map(|o| (o.node_id.clone(), o)).collect();

    let mut results = serde_json::Map::new();
    for node in &nodes {
        let entry = if let Some(output) = completed.get(&node.id) {
            serde_json::json!({
                "status": output.status,
                "result": output.result_data.as_ref().and_then(|d| serde_json::from_str::<serde_json::Value>(d).ok()),
                "error": output.error_message,
                "timestamp": output.ended_at,
            })
        } else {
            serde_json::json!({"status": "cancelled", "result": null, "error": null, "timestamp": null})
        };
        results.insert(node.id.clone(), entry);
    }

    TaskRepository::delete_all_for_execution(pool, execution_id)
        .await
        .map_err(crate::db::DatabaseError::from)?;

    let results_json = serde_json::Value::Object(results);
    ExecutionRepository::finalize(pool, execution_id, "cancelled", &results_json.to_string())
        .await
        .map_err(crate::db::DatabaseError::from)?;

    audit::record(
        pool,
        "executions",
        execution_id,
        "update",
        Some(serde_json::json!({"status": execution.status})),
        Some(serde_json::json!({"status": "cancelled"})),
    )
    .await
    .map_err(crate::db::DatabaseError::from)?;

    Ok(CancelResult {
        execution_id: execution_id.to_string(),
        pending_nodes: 0,
        executed_nodes: execution.executed_count,
        results: results_json,
        started_at: execution.started_at,
    })
}

pub async fn list_executions(pool: &DatabasePool) -> Result<Vec<Execution>> {
    Ok(ExecutionRepository::list(pool).await.map_err(crate::db::DatabaseError::from)?)
}

pub async fn get_execution(pool: &DatabasePool, id: &str) -> Result<Execution> {
    ExecutionRepository::get_by_id(pool, id)
        .await
        .map_err(crate::db::DatabaseError::from)?
        .ok_or_else(|| Error::Resource(format!("execution not found: {}", id)))
}
