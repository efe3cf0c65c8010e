//! Input monitor: polls for ready tasks, resolves their payloads, and hands
//! them to the worker pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::db::connection::DatabasePool;
use crate::db::repositories::{NodeRepository, ScriptRepository, TaskRepository};
use crate::resolver::OutputContext;
use crate::worker_pool::{TaskPayload, WorkerPool};

/// Bounds how many payloads are built concurrently per cycle.
const MAX_CONCURRENT_BUILDS: usize = 4;

pub struct InputMonitorConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
}

pub struct InputMonitor {
    pool: DatabasePool,
    worker_pool: Arc<WorkerPool>,
    config: InputMonitorConfig,
}

impl InputMonitor {
    pub fn new(pool: DatabasePool, worker_pool: Arc<WorkerPool>, config: InputMonitorConfig) -> Self {
        Self { pool, worker_pool, config }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }
            tokio::select! {
                _ = self.run_cycle() => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    async fn run_cycle(&self) {
        let ready = match TaskRepository::fetch_ready_batch(&self.pool, self.config.batch_size).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "failed to fetch ready tasks");
                tokio::time::sleep(self.config.poll_interval).await;
                return;
            }
        };

        if ready.is_empty() {
            tokio::time::sleep(self.config.poll_interval).await;
            return;
        }

        let concurrency = Arc::new(Semaphore::new(MAX_CONCURRENT_BUILDS.min(ready.len())));
        let mut builds = Vec::with_capacity(ready.len());
        for task in ready {
            let permit = concurrency.clone();
            let pool = self.pool.clone();
            builds.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.ok();
                let task_id = task.id.clone();
                let payload = build_payload(&pool, &task).await;
                (task_id, payload)
            }));
        }

        let mut payloads = Vec::new();
        let mut dispatched_task_ids = Vec::new();
        for build in builds {
            match build.await {
                Ok((task_id, Some(payload))) => {
                    dispatched_task_ids.push(task_id);
                    payloads.push(payload);
                }
                Ok((task_id, None)) => {
                    debug!(task_id, "payload preparation failed, skipping for this cycle");
                }
                Err(e) => warn!(error = %e, "payload build task panicked"),
            }
        }

        if payloads.is_empty() {
            return;
        }

        match self.worker_pool.submit_bulk(payloads) {
            Ok(()) => {
                if let Err(e) = TaskRepository::delete_batch(&self.pool, &dispatched_task_ids).await {
                    warn!(error = %e, "failed to delete dispatched task rows");
                }
            }
            Err(rejected) => {
                warn!(count = rejected.len(), "worker pool rejected bulk submission, leaving task rows for retry");
            }
        }
    }
}

/// Builds one dispatch payload, resolving placeholders against completed
/// sibling outputs. Returns `None` (skip, don't fail the batch) if the
/// node or script backing the task has vanished.
async fn build_payload(pool: &DatabasePool, task: &crate::db::models::Task) -> Option<TaskPayload> {
    let node = NodeRepository::get_by_id(pool, &task.node_id).await.ok()??;
    let script = ScriptRepository::get_by_id(pool, &node.script_id).await.ok()??;
    let params: serde_json::Value = node.parsed_params().ok()?;

    let context = OutputContext::load(pool, &node.workflow_id, &task.execution_id).await.ok()?;
    let resolved_context = context.resolve(&params);

    Some(TaskPayload {
        task_id: task.id.clone(),
        execution_id: task.execution_id.clone(),
        workflow_id: node.workflow_id.clone(),
        node_id: node.id.clone(),
        node_name: node.name.clone(),
        node_type: node.node_type.clone(),
        script_path: script.file_path,
        resolved_context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::DatabaseConnection;
    use crate::db::models::{Node, Script, Task};
    use crate::db::repositories::{ScriptRepository, WorkflowRepository};

    async fn setup() -> DatabaseConnection {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.run_migrations().await.unwrap();
        conn
    }

    async fn seed_workflow_and_script(pool: &DatabasePool) {
        WorkflowRepository::create(pool, "wf-1", "wf-1", None, 0).await.unwrap();
        ScriptRepository::create(
            pool,
            &Script::new("script-1".to_string(), "s".to_string(), "python".to_string(), "/s.py".to_string()),
        )
        .await
        .unwrap();
    }

    async fn seed_node(pool: &DatabasePool, node_id: &str, name: &str, params: &str) {
        let node = Node::new(node_id.to_string(), "wf-1".to_string(), name.to_string(), "task".to_string(), "script-1".to_string(), params.to_string());
        NodeRepository::create(pool, &node).await.unwrap();
    }

    #[tokio::test]
    async fn build_payload_resolves_placeholders_against_prior_outputs() {
        let conn = setup().await;
        let pool = conn.pool();
        seed_workflow_and_script(pool).await;
        seed_node(pool, "node-a", "fetch", "{}").await;
        seed_node(pool, "node-b", "sum_user", r#"{"value": "{{ fetch.sum }}"}"#).await;

        let output = crate::db::models::ExecutionOutput::success(
            "out-1".to_string(),
            "exec-1".to_string(),
            "node-a".to_string(),
            r#"{"sum": 7}"#.to_string(),
            chrono::Utc::now().to_rfc3339(),
        );
        crate::db::repositories::ExecutionOutputRepository::create(pool, &output).await.unwrap();

        let task = Task::new("task-1".to_string(), "exec-1".to_string(), "node-b".to_string(), 0, 0);
        let payload = build_payload(pool, &task).await.unwrap();
        assert_eq!(payload.resolved_context["value"], "7");
        assert_eq!(payload.node_id, "node-b");
    }

    #[tokio::test]
    async fn build_payload_returns_none_when_node_missing() {
        let conn = setup().await;
        let pool = conn.pool();
        let task = Task::new("task-1".to_string(), "exec-1".to_string(), "ghost-node".to_string(), 0, 0);
        assert!(build_payload(pool, &task).await.is_none());
    }

    #[tokio::test]
    async fn build_payload_returns_none_when_params_are_not_valid_json() {
        let conn = setup().await;
        let pool = conn.pool();
        seed_workflow_and_script(pool).await;
        seed_node(pool, "node-a", "fetch", "not json").await;

        let task = Task::new("task-1".to_string(), "exec-1".to_string(), "node-a".to_string(), 0, 0);
        assert!(build_payload(pool, &task).await.is_none());
    }
}
