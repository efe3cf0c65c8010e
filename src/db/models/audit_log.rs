//! AuditLog model: a before/after snapshot of every mutating orchestration
//! operation, written in the same transaction as the mutation itself.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: String,
    pub table_name: String,
    pub record_id: String,
    /// create, update, delete
    pub action: String,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub timestamp: String,
}

impl AuditLog {
    pub fn new(
        id: String,
        table_name: impl Into<String>,
        record_id: impl Into<String>,
        action: impl Into<String>,
        old_values: Option<String>,
        new_values: Option<String>,
    ) -> Self {
        Self {
            id,
            table_name: table_name.into(),
            record_id: record_id.into(),
            action: action.into(),
            old_values,
            new_values,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
