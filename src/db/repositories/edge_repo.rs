//! Edge repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::Edge;

pub struct EdgeRepository;

impl EdgeRepository {
    pub async fn create(pool: &DatabasePool, edge: &Edge) -> Result<Edge, sqlx::Error> {
        sqlx::query_as::<_, Edge>(
            "INSERT INTO edges (id, workflow_id, from_node_id, to_node_id, condition_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&edge.id)
        .bind(&edge.workflow_id)
        .bind(&edge.from_node_id)
        .bind(&edge.to_node_id)
        .bind(&edge.condition_type)
        .bind(&edge.created_at)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_workflow(pool: &DatabasePool, workflow_id: &str) -> Result<Vec<Edge>, sqlx::Error> {
        sqlx::query_as::<_, Edge>("SELECT * FROM edges WHERE workflow_id = ?")
            .bind(workflow_id)
            .fetch_all(pool)
            .await
    }

    /// Downstream nodes reachable by a single edge from `node_id`, filtered
    /// to edges whose condition matches the node's terminal status.
    pub async fn downstream_nodes(
        pool: &DatabasePool,
        node_id: &str,
        condition: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT to_node_id FROM edges WHERE from_node_id = ? AND (condition_type = ? OR condition_type = 'always')",
        )
        .bind(node_id)
        .bind(condition)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> sqlx::sqlite::SqlitePool {
        let pool = sqlx::sqlite::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE edges (id TEXT PRIMARY KEY, workflow_id TEXT, from_node_id TEXT, to_node_id TEXT, condition_type TEXT, created_at TEXT)")
            .execute(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_downstream_nodes_matches_condition() {
        let pool = setup_db().await;
        let e1 = Edge::new("e1".to_string(), "wf".to_string(), "a".to_string(), "b".to_string(), "success".to_string());
        let e2 = Edge::new("e2".to_string(), "wf".to_string(), "a".to_string(), "c".to_string(), "failure".to_string());
        EdgeRepository::create(&pool, &e1).await.unwrap();
        EdgeRepository::create(&pool, &e2).await.unwrap();

        let success_targets = EdgeRepository::downstream_nodes(&pool, "a", "success").await.unwrap();
        assert_eq!(success_targets, vec!["b".to_string()]);

        let failure_targets = EdgeRepository::downstream_nodes(&pool, "a", "failure").await.unwrap();
        assert_eq!(failure_targets, vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_downstream_nodes_always_condition() {
        let pool = setup_db().await;
        let e1 = Edge::new("e1".to_string(), "wf".to_string(), "a".to_string(), "b".to_string(), "always".to_string());
        EdgeRepository::create(&pool, &e1).await.unwrap();

        assert_eq!(EdgeRepository::downstream_nodes(&pool, "a", "success").await.unwrap(), vec!["b".to_string()]);
        assert_eq!(EdgeRepository::downstream_nodes(&pool, "a", "failure").await.unwrap(), vec!["b".to_string()]);
    }
}
