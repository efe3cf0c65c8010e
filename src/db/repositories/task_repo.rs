//! Task (execution_queue) repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::Task;

pub struct TaskRepository;

impl TaskRepository {
    pub async fn create(pool: &DatabasePool, task: &Task) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "INSERT INTO execution_queue (id, execution_id, node_id, status, priority, dependency_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&task.id)
        .bind(&task.execution_id)
        .bind(&task.node_id)
        .bind(&task.status)
        .bind(task.priority)
        .bind(task.dependency_count)
        .bind(&task.created_at)
        .fetch_one(pool)
        .await
    }

    /// Ready tasks ordered (priority desc, created_at asc), joined against
    /// nodes for payload construction by the input monitor.
    pub async fn fetch_ready_batch(
        pool: &DatabasePool,
        limit: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT * FROM execution_queue
             WHERE status = 'ready' AND dependency_count = 0
             ORDER BY priority DESC, created_at ASC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn delete_batch(pool: &DatabasePool, ids: &[String]) -> Result<(), sqlx::Error> {
        if ids.is_empty() {
            return Ok(());
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!("DELETE FROM execution_queue WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }
        query.execute(pool).await?;
        Ok(())
    }

    pub async fn delete_all_for_execution(pool: &DatabasePool, execution_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM execution_queue WHERE execution_id = ?")
            .bind(execution_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Atomic conditional decrement: never drives dependency_count below
    /// zero, and flips status to ready exactly when it lands on zero.
    pub async fn decrement_dependency(
        pool: &DatabasePool,
        execution_id: &str,
        node_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE execution_queue
             SET dependency_count = dependency_count - 1
             WHERE execution_id = ? AND node_id = ? AND dependency_count > 0",
        )
        .bind(execution_id)
        .bind(node_id)
        .execute(pool)
        .await?;

        sqlx::query(
            "UPDATE execution_queue
             SET status = 'ready'
             WHERE execution_id = ? AND node_id = ? AND dependency_count = 0 AND status = 'pending'",
        )
        .bind(execution_id)
        .bind(node_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn list_for_execution(pool: &DatabasePool, execution_id: &str) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM execution_queue WHERE execution_id = ?")
            .bind(execution_id)
            .fetch_all(pool)
            .await
    }
}
