//! Script CRUD endpoint handlers

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiResult;
use crate::api::models::{ScriptCreatedResponse, ScriptRequest, ScriptResponse};
use crate::api::response;
use crate::api::routes::AppState;
use crate::orchestration;

/// POST /scripts/create
pub async fn create_script(
    State(app_state): State<AppState>,
    Json(req): Json<ScriptRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let result = orchestration::create_script(app_state.db.pool(), req.into()).await?;
    Ok(response::created(ScriptCreatedResponse::from(result)))
}

/// GET /scripts/list
pub async fn list_scripts(State(app_state): State<AppState>) -> ApiResult<impl axum::response::IntoResponse> {
    let scripts = orchestration::list_scripts(app_state.db.pool()).await?;
    let items: Vec<ScriptResponse> = scripts.into_iter().map(ScriptResponse::from).collect();
    Ok(response::ok(items))
}

/// GET /scripts/{id}
pub async fn get_script(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let script = orchestration::get_script(app_state.db.pool(), &id).await?;
    Ok(response::ok(ScriptResponse::from(script)))
}

/// POST /scripts/delete/{id}
pub async fn delete_script(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let script = orchestration::delete_script(app_state.db.pool(), &id).await?;
    Ok(response::accepted(serde_json::json!({
        "script_id": script.id,
        "script_name": script.name,
    })))
}
