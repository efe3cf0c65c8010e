//! API data transfer objects (DTOs) and response models
//!
//! Provides request/response structures for API endpoints, mapping between
//! the wire JSON shapes and the orchestration layer's in-process types.

pub mod execution;
pub mod script;
pub mod workflow;

pub use execution::{CancelResponse, ExecutionResponse, TriggerResponse};
pub use script::{ScriptCreatedResponse, ScriptRequest, ScriptResponse};
pub use workflow::{WorkflowCreatedResponse, WorkflowRequest, WorkflowResponse};

/// System health response
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(status: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            database: database.into(),
            version: crate::version::VERSION.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// System info response
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SystemInfoResponse {
    pub version: String,
    pub build_timestamp: String,
    pub git_commit: String,
    pub rust_version: String,
}

/// System metrics response
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SystemMetricsResponse {
    pub total_workflows: i64,
    pub total_scripts: i64,
    pub total_executions: i64,
    pub active_executions: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response() {
        let health = HealthResponse::new("ok", "connected");
        assert_eq!(health.status, "ok");
        assert_eq!(health.database, "connected");
        assert!(!health.version.is_empty());
        assert!(!health.timestamp.is_empty());
    }

    #[test]
    fn test_system_info_response() {
        let info = SystemInfoResponse {
            version: "1.0.0".to_string(),
            build_timestamp: "2025-01-01".to_string(),
            git_commit: "abc123".to_string(),
            rust_version: "1.75".to_string(),
        };
        assert_eq!(info.version, "1.0.0");
        assert_eq!(info.git_commit, "abc123");
    }

    #[test]
    fn test_system_metrics_response() {
        let metrics = SystemMetricsResponse {
            total_workflows: 20,
            total_scripts: 5,
            total_executions: 500,
            active_executions: 3,
        };
        assert_eq!(metrics.total_workflows, 20);
        assert_eq!(metrics.active_executions, 3);
    }
}
