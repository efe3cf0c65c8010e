//! Script CRUD: rejects delete while any node references the script.
//!
//! Script *content* management (writing the file to disk) is outside this
//! implementation's scope; callers supply a `file_path` that already exists.

use uuid::Uuid;

use crate::db::connection::DatabasePool;
use crate::db::models::Script;
use crate::db::repositories::{NodeRepository, ScriptRepository};
use crate::orchestration::audit;
use crate::orchestration::types::ScriptCreateResult;
use crate::{Error, Result};

pub struct CreateScriptRequest {
    pub name: String,
    pub description: Option<String>,
    pub language: String,
    pub file_path: String,
    pub input_schema: Option<String>,
    pub output_schema: Option<String>,
}

pub async fn create_script(pool: &DatabasePool, req: CreateScriptRequest) -> Result<ScriptCreateResult> {
    if req.name.trim().is_empty() {
        return Err(Error::Validation("script name cannot be empty".to_string()));
    }
    if ScriptRepository::find_by_name(pool, &req.name)
        .await
        .map_err(crate::db::DatabaseError::from)?
        .is_some()
    {
        return Err(Error::Validation(format!("script name already in use: {}", req.name)));
    }

    let mut script = Script::new(
        Uuid::new_v4().to_string(),
        req.name.clone(),
        req.language,
        req.file_path.clone(),
    );
    script.description = req.description;
    script.input_schema = req.input_schema;
    script.output_schema = req.output_schema;

    let created = ScriptRepository::create(pool, &script)
        .await
        .map_err(crate::db::DatabaseError::from)?;

    audit::record(
        pool,
        "scripts",
        &created.id,
        "create",
        None,
        Some(serde_json::json!({"name": created.name})),
    )
    .await
    .map_err(crate::db::DatabaseError::from)?;

    Ok(ScriptCreateResult {
        script_id: created.id,
        absolute_path: created.file_path,
        created_at: created.created_at,
    })
}

pub async fn list_scripts(pool: &DatabasePool) -> Result<Vec<Script>> {
    Ok(ScriptRepository::list(pool).await.map_err(crate::db::DatabaseError::from)?)
}

pub async fn get_script(pool: &DatabasePool, id: &str) -> Result<Script> {
    ScriptRepository::get_by_id(pool, id)
        .await
        .map_err(crate::db::DatabaseError::from)?
        .ok_or_else(|| Error::Resource(format!("script not found: {}", id)))
}

pub async fn delete_script(pool: &DatabasePool, id: &str) -> Result<Script> {
    let script = get_script(pool, id).await?;

    let refs = NodeRepository::count_referencing_script(pool, id)
        .await
        .map_err(crate::db::DatabaseError::from)?;
    if refs > 0 {
        return Err(Error::BusinessLogic(format!(
            "script {} is referenced by {} node(s)",
            id, refs
        )));
    }

    ScriptRepository::delete(pool, id).await.map_err(crate::db::DatabaseError::from)?;

    audit::record(
        pool,
        "scripts",
        id,
        "delete",
        Some(serde_json::json!({"name": script.name})),
        None,
    )
    .await
    .map_err(crate::db::DatabaseError::from)?;

    Ok(script)
}
