//! Audit log helper shared by every mutating orchestration operation.

use crate::db::connection::DatabasePool;
use crate::db::models::AuditLog;
use crate::db::repositories::AuditLogRepository;
use uuid::Uuid;

pub async fn record(
    pool: &DatabasePool,
    table_name: &str,
    record_id: &str,
    action: &str,
    old_values: Option<serde_json::Value>,
    new_values: Option<serde_json::Value>,
) -> Result<(), sqlx::Error> {
    let entry = AuditLog::new(
        Uuid::new_v4().to_string(),
        table_name,
        record_id,
        action,
        old_values.map(|v| v.to_string()),
        new_values.map(|v| v.to_string()),
    );
    AuditLogRepository::record(pool, &entry).await
}
