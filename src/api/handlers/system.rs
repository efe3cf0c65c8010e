//! System information and metrics endpoint handlers

use axum::extract::State;

use crate::api::models::{SystemInfoResponse, SystemMetricsResponse};
use crate::api::response;
use crate::api::routes::AppState;
use crate::db::repositories::{ExecutionRepository, ScriptRepository, WorkflowRepository};

/// GET /api/v1/system/info
pub async fn system_info() -> impl axum::response::IntoResponse {
    let info = SystemInfoResponse {
        version: crate::version::VERSION.to_string(),
        build_timestamp: env!("CARGO_PKG_VERSION").to_string(),
        git_commit: "unknown".to_string(),
        rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
    };
    response::ok(info)
}

/// GET /api/v1/system/metrics
pub async fn system_metrics(State(app_state): State<AppState>) -> impl axum::response::IntoResponse {
    let metrics = gather_system_metrics(&app_state).await.unwrap_or(SystemMetricsResponse {
        total_workflows: 0,
        total_scripts: 0,
        total_executions: 0,
        active_executions: 0,
    });
    response::ok(metrics)
}

async fn gather_system_metrics(app_state: &AppState) -> Result<SystemMetricsResponse, sqlx::Error> {
    let pool = app_state.db.pool();

    let workflows = WorkflowRepository::list(pool).await?;
    let scripts = ScriptRepository::list(pool).await?;
    let executions = ExecutionRepository::list(pool).await?;
    let active = executions.iter().filter(|e| !e.is_terminal()).count();

    Ok(SystemMetricsResponse {
        total_workflows: workflows.len() as i64,
        total_scripts: scripts.len() as i64,
        total_executions: executions.len() as i64,
        active_executions: active as i64,
    })
}
