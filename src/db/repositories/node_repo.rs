//! Node repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::Node;
use chrono::Utc;

pub struct NodeRepository;

impl NodeRepository {
    pub async fn create(pool: &DatabasePool, node: &Node) -> Result<Node, sqlx::Error> {
        sqlx::query_as::<_, Node>(
            "INSERT INTO nodes (id, workflow_id, name, node_type, script_id, params, max_retries, timeout_seconds, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&node.id)
        .bind(&node.workflow_id)
        .bind(&node.name)
        .bind(&node.node_type)
        .bind(&node.script_id)
        .bind(&node.params)
        .bind(node.max_retries)
        .bind(node.timeout_seconds)
        .bind(&node.created_at)
        .bind(&node.updated_at)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_workflow(pool: &DatabasePool, workflow_id: &str) -> Result<Vec<Node>, sqlx::Error> {
        sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE workflow_id = ?")
            .bind(workflow_id)
            .fetch_all(pool)
            .await
    }

    pub async fn get_by_id(pool: &DatabasePool, id: &str) -> Result<Option<Node>, sqlx::Error> {
        sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(
        pool: &DatabasePool,
        workflow_id: &str,
        name: &str,
    ) -> Result<Option<Node>, sqlx::Error> {
        sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE workflow_id = ? AND name = ?")
            .bind(workflow_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Number of incoming edges for each node, used to seed dependency_count on trigger.
    pub async fn incoming_edge_count(pool: &DatabasePool, node_id: &str) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM edges WHERE to_node_id = ?")
            .bind(node_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    pub async fn count_referencing_script(pool: &DatabasePool, script_id: &str) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM nodes WHERE script_id = ?")
            .bind(script_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    #[allow(dead_code)]
    pub fn touch(node: &mut Node) {
        node.updated_at = Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Edge, Script, Workflow};

    async fn setup_db() -> sqlx::sqlite::SqlitePool {
        let pool = sqlx::sqlite::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE workflows (id TEXT PRIMARY KEY, name TEXT, description TEXT, status TEXT, priority INTEGER, created_at TEXT, updated_at TEXT)")
            .execute(&pool).await.unwrap();
        sqlx::query("CREATE TABLE scripts (id TEXT PRIMARY KEY, name TEXT, description TEXT, language TEXT, file_path TEXT, input_schema TEXT, output_schema TEXT, test_status TEXT, created_at TEXT, updated_at TEXT)")
            .execute(&pool).await.unwrap();
        sqlx::query("CREATE TABLE nodes (id TEXT PRIMARY KEY, workflow_id TEXT, name TEXT, node_type TEXT, script_id TEXT, params TEXT, max_retries INTEGER, timeout_seconds INTEGER, created_at TEXT, updated_at TEXT)")
            .execute(&pool).await.unwrap();
        sqlx::query("CREATE TABLE edges (id TEXT PRIMARY KEY, workflow_id TEXT, from_node_id TEXT, to_node_id TEXT, condition_type TEXT, created_at TEXT)")
            .execute(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_list_nodes() {
        let pool = setup_db().await;
        let _wf = Workflow::new("wf-1".to_string(), "Test".to_string());
        let _script = Script::new("script-1".to_string(), "s".to_string(), "python".to_string(), "/s.py".to_string());

        let node = Node::new(
            "node-1".to_string(),
            "wf-1".to_string(),
            "a".to_string(),
            "task".to_string(),
            "script-1".to_string(),
            "{}".to_string(),
        );
        NodeRepository::create(&pool, &node).await.unwrap();

        let nodes = NodeRepository::list_by_workflow(&pool, "wf-1").await.unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_incoming_edge_count() {
        let pool = setup_db().await;
        let node_a = Node::new("a".to_string(), "wf-1".to_string(), "a".to_string(), "task".to_string(), "s".to_string(), "{}".to_string());
        let node_b = Node::new("b".to_string(), "wf-1".to_string(), "b".to_string(), "task".to_string(), "s".to_string(), "{}".to_string());
        NodeRepository::create(&pool, &node_a).await.unwrap();
        NodeRepository::create(&pool, &node_b).await.unwrap();

        assert_eq!(NodeRepository::incoming_edge_count(&pool, "b").await.unwrap(), 0);

        let edge = Edge::new("e-1".to_string(), "wf-1".to_string(), "a".to_string(), "b".to_string(), "success".to_string());
        sqlx::query("INSERT INTO edges (id, workflow_id, from_node_id, to_node_id, condition_type, created_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(&edge.id).bind(&edge.workflow_id).bind(&edge.from_node_id).bind(&edge.to_node_id).bind(&edge.condition_type).bind(&edge.created_at)
            .execute(&pool).await.unwrap();

        assert_eq!(NodeRepository::incoming_edge_count(&pool, "b").await.unwrap(), 1);
    }
}
