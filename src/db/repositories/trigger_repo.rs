//! Trigger repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::Trigger;

pub struct TriggerRepository;

impl TriggerRepository {
    pub async fn create(pool: &DatabasePool, trigger: &Trigger) -> Result<Trigger, sqlx::Error> {
        sqlx::query_as::<_, Trigger>(
            "INSERT INTO triggers (id, workflow_id, trigger_type, config, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&trigger.id)
        .bind(&trigger.workflow_id)
        .bind(&trigger.trigger_type)
        .bind(&trigger.config)
        .bind(trigger.is_active)
        .bind(&trigger.created_at)
        .bind(&trigger.updated_at)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_workflow(pool: &DatabasePool, workflow_id: &str) -> Result<Vec<Trigger>, sqlx::Error> {
        sqlx::query_as::<_, Trigger>("SELECT * FROM triggers WHERE workflow_id = ?")
            .bind(workflow_id)
            .fetch_all(pool)
            .await
    }
}
