//! Script model: an external code resource invoked by nodes at task time.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Script {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub language: String,
    pub file_path: String,
    pub input_schema: Option<String>,
    pub output_schema: Option<String>,
    /// untested, passing, failing
    pub test_status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Script {
    pub fn new(id: String, name: String, language: String, file_path: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            name,
            description: None,
            language,
            file_path,
            input_schema: None,
            output_schema: None,
            test_status: "untested".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
