//! Orchestration layer: transactional, validated CRUD over the relational
//! store, composing atomic repository operations into workflow-level
//! operations. Every mutating call writes an audit log entry.

pub mod audit;
pub mod execution;
pub mod script;
pub mod types;
pub mod workflow;

pub use execution::{cancel_execution, get_execution, list_executions, trigger_workflow};
pub use script::{create_script, delete_script, get_script, list_scripts, CreateScriptRequest};
pub use types::{CancelResult, CreateWorkflowResult, EdgeSpec, NodeSpec, ScriptCreateResult, TriggerResult, TriggerSpec, WorkflowSpec};
pub use workflow::{create_workflow, delete_workflow, get_workflow, list_workflows, update_workflow};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::DatabaseConnection;

    async fn setup() -> DatabaseConnection {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.run_migrations().await.unwrap();
        conn
    }

    async fn seed_script(pool: &crate::db::connection::DatabasePool, name: &str) {
        create_script(
            pool,
            CreateScriptRequest {
                name: name.to_string(),
                description: None,
                language: "python".to_string(),
                file_path: format!("/scripts/{name}.py"),
                input_schema: None,
                output_schema: None,
            },
        )
        .await
        .unwrap();
    }

    fn diamond_spec() -> WorkflowSpec {
        WorkflowSpec {
            name: "diamond".to_string(),
            description: None,
            priority: 5,
            nodes: vec![
                NodeSpec { name: "a".to_string(), node_type: "task".to_string(), script_name: "s".to_string(), params: serde_json::json!({}), max_retries: 0, timeout_seconds: 300 },
                NodeSpec { name: "b".to_string(), node_type: "task".to_string(), script_name: "s".to_string(), params: serde_json::json!({}), max_retries: 0, timeout_seconds: 300 },
                NodeSpec { name: "c".to_string(), node_type: "task".to_string(), script_name: "s".to_string(), params: serde_json::json!({}), max_retries: 0, timeout_seconds: 300 },
                NodeSpec { name: "d".to_string(), node_type: "task".to_string(), script_name: "s".to_string(), params: serde_json::json!({}), max_retries: 0, timeout_seconds: 300 },
            ],
            edges: vec![
                EdgeSpec { from_node: "a".to_string(), to_node: "b".to_string(), condition_type: "success".to_string() },
                EdgeSpec { from_node: "a".to_string(), to_node: "c".to_string(), condition_type: "success".to_string() },
                EdgeSpec { from_node: "b".to_string(), to_node: "d".to_string(), condition_type: "success".to_string() },
                EdgeSpec { from_node: "c".to_string(), to_node: "d".to_string(), condition_type: "success".to_string() },
            ],
            triggers: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_workflow_seeds_dependency_counts_on_trigger() {
        let conn = setup().await;
        let pool = conn.pool();
        seed_script(pool, "s").await;

        let created = create_workflow(pool, diamond_spec()).await.unwrap();
        assert_eq!(created.nodes, 4);
        assert_eq!(created.edges, 4);

        let triggered = trigger_workflow(pool, &created.workflow_id).await.unwrap();
        assert_eq!(triggered.pending_nodes, 4);

        let tasks = crate::db::repositories::TaskRepository::list_for_execution(pool, &triggered.execution_id)
            .await
            .unwrap();
        let by_dep_count: std::collections::HashMap<i64, usize> =
            tasks.iter().fold(std::collections::HashMap::new(), |mut acc, t| {
                *acc.entry(t.dependency_count).or_insert(0) += 1;
                acc
            });
        assert_eq!(by_dep_count.get(&0), Some(&1)); // node a
        assert_eq!(by_dep_count.get(&1), Some(&2)); // b, c
        assert_eq!(by_dep_count.get(&2), Some(&1)); // d
    }

    #[tokio::test]
    async fn test_create_workflow_rejects_duplicate_name() {
        let conn = setup().await;
        let pool = conn.pool();
        seed_script(pool, "s").await;
        create_workflow(pool, diamond_spec()).await.unwrap();

        let err = create_workflow(pool, diamond_spec()).await.unwrap_err();
        assert!(matches!(err, crate::Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_workflow_rejects_unknown_script() {
        let conn = setup().await;
        let pool = conn.pool();
        let err = create_workflow(pool, diamond_spec()).await.unwrap_err();
        assert!(matches!(err, crate::Error::BusinessLogic(_)));
    }

    #[tokio::test]
    async fn test_delete_workflow_rejects_active_execution() {
        let conn = setup().await;
        let pool = conn.pool();
        seed_script(pool, "s").await;
        let created = create_workflow(pool, diamond_spec()).await.unwrap();
        trigger_workflow(pool, &created.workflow_id).await.unwrap();

        let err = delete_workflow(pool, &created.workflow_id).await.unwrap_err();
        assert!(matches!(err, crate::Error::BusinessLogic(_)));
    }

    #[tokio::test]
    async fn test_cancel_execution_marks_pending_nodes_cancelled() {
        let conn = setup().await;
        let pool = conn.pool();
        seed_script(pool, "s").await;
        let created = create_workflow(pool, diamond_spec()).await.unwrap();
        let triggered = trigger_workflow(pool, &created.workflow_id).await.unwrap();

        let cancelled = cancel_execution(pool, &triggered.execution_id).await.unwrap();
        assert_eq!(cancelled.results["a"]["status"], "cancelled");

        let remaining = crate::db::repositories::TaskRepository::list_for_execution(pool, &triggered.execution_id)
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_delete_script_rejects_when_referenced() {
        let conn = setup().await;
        let pool = conn.pool();
        seed_script(pool, "s").await;
        let created = create_workflow(pool, diamond_spec()).await.unwrap();
        let script = crate::db::repositories::ScriptRepository::find_by_name(pool, "s").await.unwrap().unwrap();

        let err = delete_script(pool, &script.id).await.unwrap_err();
        assert!(matches!(err, crate::Error::BusinessLogic(_)));

        delete_workflow(pool, &created.workflow_id).await.unwrap();
        // Deleting the workflow cascades nodes, so the script reference is gone now.
        delete_script(pool, &script.id).await.unwrap();
    }
}
