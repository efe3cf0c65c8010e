//! Execution trigger/cancel/list endpoint handlers

use axum::extract::{Path, State};

use crate::api::error::ApiResult;
use crate::api::models::{CancelResponse, ExecutionResponse, TriggerResponse};
use crate::api::response;
use crate::api::routes::AppState;
use crate::orchestration;

/// POST /executions/create/{workflow_id}
pub async fn create_execution(
    State(app_state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let result = orchestration::trigger_workflow(app_state.db.pool(), &workflow_id).await?;
    Ok(response::created(TriggerResponse::from(result)))
}

/// POST /executions/cancel/{id}
pub async fn cancel_execution(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let result = orchestration::cancel_execution(app_state.db.pool(), &id).await?;
    Ok(response::ok(CancelResponse::from(result)))
}

/// GET /executions/list
pub async fn list_executions(State(app_state): State<AppState>) -> ApiResult<impl axum::response::IntoResponse> {
    let executions = orchestration::list_executions(app_state.db.pool()).await?;
    let items: Vec<ExecutionResponse> = executions.into_iter().map(ExecutionResponse::from).collect();
    Ok(response::ok(items))
}

/// GET /executions/{id}
pub async fn get_execution(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let execution = orchestration::get_execution(app_state.db.pool(), &id).await?;
    Ok(response::ok(ExecutionResponse::from(execution)))
}
