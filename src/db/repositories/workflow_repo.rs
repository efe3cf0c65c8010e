//! Workflow repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::Workflow;
use chrono::Utc;

pub struct WorkflowRepository;

impl WorkflowRepository {
    pub async fn create(
        pool: &DatabasePool,
        id: &str,
        name: &str,
        description: Option<&str>,
        priority: i64,
    ) -> Result<Workflow, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query_as::<_, Workflow>(
            "INSERT INTO workflows (id, name, description, status, priority, created_at, updated_at)
             VALUES (?, ?, ?, 'draft', ?, ?, ?)
             RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(priority)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    pub async fn get_by_id(pool: &DatabasePool, id: &str) -> Result<Option<Workflow>, sqlx::Error> {
        sqlx::query_as::<_, Workflow>("SELECT * FROM workflows WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &DatabasePool, name: &str) -> Result<Option<Workflow>, sqlx::Error> {
        sqlx::query_as::<_, Workflow>("SELECT * FROM workflows WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<Workflow>, sqlx::Error> {
        sqlx::query_as::<_, Workflow>("SELECT * FROM workflows ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn update_status(pool: &DatabasePool, id: &str, status: &str) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE workflows SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(&now)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn delete(pool: &DatabasePool, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// True if any execution for this workflow is pending or running.
    pub async fn has_active_executions(pool: &DatabasePool, workflow_id: &str) -> Result<bool, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM executions WHERE workflow_id = ? AND status IN ('pending', 'running')",
        )
        .bind(workflow_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0 > 0)
    }
}
