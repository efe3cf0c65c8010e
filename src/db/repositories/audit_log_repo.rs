//! AuditLog repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::AuditLog;

pub struct AuditLogRepository;

impl AuditLogRepository {
    pub async fn record(pool: &DatabasePool, entry: &AuditLog) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO audit_log (id, table_name, record_id, action, old_values, new_values, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.table_name)
        .bind(&entry.record_id)
        .bind(&entry.action)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(&entry.timestamp)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_record(
        pool: &DatabasePool,
        table_name: &str,
        record_id: &str,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            "SELECT * FROM audit_log WHERE table_name = ? AND record_id = ? ORDER BY timestamp ASC",
        )
        .bind(table_name)
        .bind(record_id)
        .fetch_all(pool)
        .await
    }
}
