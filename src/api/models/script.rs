//! Script API models and DTOs

use serde::{Deserialize, Serialize};

use crate::orchestration::script::CreateScriptRequest as OrchestrationCreateScriptRequest;
use crate::orchestration::types::ScriptCreateResult;

/// Body of `POST /scripts/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub language: String,
    pub file_path: String,
    #[serde(default)]
    pub input_schema: Option<String>,
    #[serde(default)]
    pub output_schema: Option<String>,
}

impl From<ScriptRequest> for OrchestrationCreateScriptRequest {
    fn from(req: ScriptRequest) -> Self {
        OrchestrationCreateScriptRequest {
            name: req.name,
            description: req.description,
            language: req.language,
            file_path: req.file_path,
            input_schema: req.input_schema,
            output_schema: req.output_schema,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptCreatedResponse {
    pub script_id: String,
    pub absolute_path: String,
    pub created_at: String,
}

impl From<ScriptCreateResult> for ScriptCreatedResponse {
    fn from(result: ScriptCreateResult) -> Self {
        Self {
            script_id: result.script_id,
            absolute_path: result.absolute_path,
            created_at: result.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub language: String,
    pub file_path: String,
    pub test_status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::db::models::Script> for ScriptResponse {
    fn from(s: crate::db::models::Script) -> Self {
        Self {
            id: s.id,
            name: s.name,
            description: s.description,
            language: s.language,
            file_path: s.file_path,
            test_status: s.test_status,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}
