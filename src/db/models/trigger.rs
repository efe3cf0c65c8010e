//! Trigger model: a configured entry point that can fire a workflow execution.
//!
//! Only manual triggering by workflow id is driven by this implementation
//! (see orchestration::trigger_workflow); schedule/webhook/file/event rows
//! are persisted and exposed for operators but nothing polls or fires them
//! automatically.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trigger {
    pub id: String,
    pub workflow_id: String,
    /// schedule, webhook, file, event
    pub trigger_type: String,
    pub config: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Trigger {
    pub fn new(id: String, workflow_id: String, trigger_type: String, config: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            workflow_id,
            trigger_type,
            config,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_creation() {
        let trigger = Trigger::new(
            "trigger-1".to_string(),
            "workflow-1".to_string(),
            "webhook".to_string(),
            "{}".to_string(),
        );
        assert!(trigger.is_active);
    }
}
