//! Workflow CRUD endpoint handlers

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiResult;
use crate::api::models::{WorkflowCreatedResponse, WorkflowRequest, WorkflowResponse};
use crate::api::response;
use crate::api::routes::AppState;
use crate::orchestration;

/// POST /workflows/create
pub async fn create_workflow(
    State(app_state): State<AppState>,
    Json(req): Json<WorkflowRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let result = orchestration::create_workflow(app_state.db.pool(), req.into()).await?;
    Ok(response::created(WorkflowCreatedResponse::from(result)))
}

/// GET /workflows/list
pub async fn list_workflows(State(app_state): State<AppState>) -> ApiResult<impl axum::response::IntoResponse> {
    let workflows = orchestration::list_workflows(app_state.db.pool()).await?;
    let items: Vec<WorkflowResponse> = workflows.into_iter().map(WorkflowResponse::from).collect();
    Ok(response::ok(items))
}

/// GET /workflows/{id}
pub async fn get_workflow(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let workflow = orchestration::get_workflow(app_state.db.pool(), &id).await?;
    Ok(response::ok(WorkflowResponse::from(workflow)))
}

/// PUT /workflows/update/{id}
pub async fn update_workflow(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<WorkflowRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let result = orchestration::update_workflow(app_state.db.pool(), &id, req.into()).await?;
    Ok(response::ok(WorkflowCreatedResponse::from(result)))
}

/// DELETE /workflows/delete/{id}
pub async fn delete_workflow(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    orchestration::delete_workflow(app_state.db.pool(), &id).await?;
    Ok(response::no_content())
}
