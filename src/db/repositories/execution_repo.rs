//! Execution repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::Execution;
use chrono::Utc;

pub struct ExecutionRepository;

impl ExecutionRepository {
    pub async fn create(pool: &DatabasePool, execution: &Execution) -> Result<Execution, sqlx::Error> {
        sqlx::query_as::<_, Execution>(
            "INSERT INTO executions (id, workflow_id, status, pending_count, executed_count, results, started_at, ended_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&execution.id)
        .bind(&execution.workflow_id)
        .bind(&execution.status)
        .bind(execution.pending_count)
        .bind(execution.executed_count)
        .bind(&execution.results)
        .bind(&execution.started_at)
        .bind(&execution.ended_at)
        .fetch_one(pool)
        .await
    }

    pub async fn get_by_id(pool: &DatabasePool, id: &str) -> Result<Option<Execution>, sqlx::Error> {
        sqlx::query_as::<_, Execution>("SELECT * FROM executions WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<Execution>, sqlx::Error> {
        sqlx::query_as::<_, Execution>("SELECT * FROM executions ORDER BY started_at DESC")
            .fetch_all(pool)
            .await
    }

    /// Atomically record one more node completion: increments executed_count
    /// and decrements pending_count (never below zero).
    pub async fn record_node_completion(pool: &DatabasePool, execution_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE executions
             SET executed_count = executed_count + 1,
                 pending_count = MAX(pending_count - 1, 0)
             WHERE id = ?",
        )
        .bind(execution_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn finalize(
        pool: &DatabasePool,
        id: &str,
        status: &str,
        results: &str,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE executions SET status = ?, results = ?, ended_at = ? WHERE id = ?")
            .bind(status)
            .bind(results)
            .bind(&now)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_status(pool: &DatabasePool, id: &str, status: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE executions SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// No tasks remain pending/ready/running for this execution.
    pub async fn has_unfinished_tasks(pool: &DatabasePool, execution_id: &str) -> Result<bool, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM execution_queue WHERE execution_id = ? AND status != 'cancelled'",
        )
        .bind(execution_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0 > 0)
    }
}
