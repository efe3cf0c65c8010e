//! Placeholder resolver: substitutes `{{ node_name.field }}` tokens in a
//! task's parameter map using prior execution outputs.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::db::connection::DatabasePool;
use crate::db::models::ExecutionOutput;
use crate::db::repositories::{ExecutionOutputRepository, NodeRepository};

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\.([^\s}]+)\s*\}\}").unwrap())
}

/// A successful node's output, keyed by node name, as consulted during
/// substitution. Built once per batch by [`OutputContext::load`].
pub struct OutputContext {
    outputs_by_name: HashMap<String, ExecutionOutput>,
}

impl OutputContext {
    /// Bulk mode: one query for node name→id, one for outputs.
    pub async fn load(
        pool: &DatabasePool,
        workflow_id: &str,
        execution_id: &str,
    ) -> Result<Self, sqlx::Error> {
        let nodes = NodeRepository::list_by_workflow(pool, workflow_id).await?;
        let outputs = ExecutionOutputRepository::list_for_execution(pool, execution_id).await?;
        let outputs_by_id: HashMap<String, ExecutionOutput> =
            outputs.into_iter().map(|o| (o.node_id.clone(), o)).collect();

        let mut outputs_by_name = HashMap::new();
        for node in nodes {
            if let Some(output) = outputs_by_id.get(&node.id) {
                outputs_by_name.insert(node.name, output.clone());
            }
        }
        Ok(Self { outputs_by_name })
    }

    /// Resolve every token in `value`, recursing into objects and arrays.
    /// Scalars that aren't strings pass through unchanged; unresolved or
    /// unknown-name tokens are left verbatim.
    pub fn resolve(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.resolve_string(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.resolve(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn resolve_string(&self, input: &str) -> String {
        token_re()
            .replace_all(input, |caps: &regex::Captures| {
                let node_name = &caps[1];
                let field = &caps[2];
                self.lookup(node_name, field)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn lookup(&self, node_name: &str, field: &str) -> Option<String> {
        let output = self.outputs_by_name.get(node_name)?;
        if output.status != "success" {
            return None;
        }
        let data = output.result_data.as_ref()?;
        let parsed: Value = serde_json::from_str(data).ok()?;
        let obj = parsed.as_object()?;
        let field_value = obj.get(field)?;
        Some(match field_value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::DatabaseConnection;
    use crate::db::models::Node;

    async fn setup() -> DatabaseConnection {
        let conn = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        conn.run_migrations().await.unwrap();
        conn
    }

    #[tokio::test]
    async fn test_resolves_known_field() {
        let conn = setup().await;
        let pool = conn.pool();

        crate::db::repositories::WorkflowRepository::create(pool, "wf-1", "wf", None, 0)
            .await
            .unwrap();
        let node = Node::new("node-a".to_string(), "wf-1".to_string(), "fetch".to_string(), "task".to_string(), "script-1".to_string(), "{}".to_string());
        crate::db::repositories::ScriptRepository::create(
            pool,
            &crate::db::models::Script::new("script-1".to_string(), "s".to_string(), "python".to_string(), "/s.py".to_string()),
        )
        .await
        .unwrap();
        NodeRepository::create(pool, &node).await.unwrap();

        let output = ExecutionOutput::success(
            "out-1".to_string(),
            "exec-1".to_string(),
            "node-a".to_string(),
            r#"{"sum": 42}"#.to_string(),
            chrono::Utc::now().to_rfc3339(),
        );
        ExecutionOutputRepository::create(pool, &output).await.unwrap();

        let ctx = OutputContext::load(pool, "wf-1", "exec-1").await.unwrap();
        let resolved = ctx.resolve(&serde_json::json!({"value": "{{ fetch.sum }}"}));
        assert_eq!(resolved["value"], "42");
    }

    #[tokio::test]
    async fn test_unknown_node_left_verbatim() {
        let conn = setup().await;
        let pool = conn.pool();
        let ctx = OutputContext::load(pool, "wf-1", "exec-1").await.unwrap();
        let resolved = ctx.resolve(&serde_json::json!({"value": "{{ missing.field }}"}));
        assert_eq!(resolved["value"], "{{ missing.field }}");
    }

    #[test]
    fn test_non_string_values_pass_through() {
        let ctx = OutputContext { outputs_by_name: HashMap::new() };
        let resolved = ctx.resolve(&serde_json::json!({"count": 3, "flag": true}));
        assert_eq!(resolved["count"], 3);
        assert_eq!(resolved["flag"], true);
    }
}
