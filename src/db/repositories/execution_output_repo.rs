//! ExecutionOutput repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::ExecutionOutput;

pub struct ExecutionOutputRepository;

impl ExecutionOutputRepository {
    pub async fn create(pool: &DatabasePool, output: &ExecutionOutput) -> Result<ExecutionOutput, sqlx::Error> {
        sqlx::query_as::<_, ExecutionOutput>(
            "INSERT INTO execution_outputs (id, execution_id, node_id, status, result_data, error_message, started_at, ended_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&output.id)
        .bind(&output.execution_id)
        .bind(&output.node_id)
        .bind(&output.status)
        .bind(&output.result_data)
        .bind(&output.error_message)
        .bind(&output.started_at)
        .bind(&output.ended_at)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_execution(pool: &DatabasePool, execution_id: &str) -> Result<Vec<ExecutionOutput>, sqlx::Error> {
        sqlx::query_as::<_, ExecutionOutput>("SELECT * FROM execution_outputs WHERE execution_id = ?")
            .bind(execution_id)
            .fetch_all(pool)
            .await
    }

    /// Bulk fetch of a node's outputs by name for placeholder resolution:
    /// one query against named nodes already resolved to ids by the caller.
    pub async fn get(
        pool: &DatabasePool,
        execution_id: &str,
        node_id: &str,
    ) -> Result<Option<ExecutionOutput>, sqlx::Error> {
        sqlx::query_as::<_, ExecutionOutput>(
            "SELECT * FROM execution_outputs WHERE execution_id = ? AND node_id = ?",
        )
        .bind(execution_id)
        .bind(node_id)
        .fetch_optional(pool)
        .await
    }
}
