//! Script repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::Script;
use chrono::Utc;

pub struct ScriptRepository;

impl ScriptRepository {
    pub async fn create(pool: &DatabasePool, script: &Script) -> Result<Script, sqlx::Error> {
        sqlx::query_as::<_, Script>(
            "INSERT INTO scripts (id, name, description, language, file_path, input_schema, output_schema, test_status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&script.id)
        .bind(&script.name)
        .bind(&script.description)
        .bind(&script.language)
        .bind(&script.file_path)
        .bind(&script.input_schema)
        .bind(&script.output_schema)
        .bind(&script.test_status)
        .bind(&script.created_at)
        .bind(&script.updated_at)
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &DatabasePool) -> Result<Vec<Script>, sqlx::Error> {
        sqlx::query_as::<_, Script>("SELECT * FROM scripts ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn get_by_id(pool: &DatabasePool, id: &str) -> Result<Option<Script>, sqlx::Error> {
        sqlx::query_as::<_, Script>("SELECT * FROM scripts WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &DatabasePool, name: &str) -> Result<Option<Script>, sqlx::Error> {
        sqlx::query_as::<_, Script>("SELECT * FROM scripts WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &DatabasePool, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM scripts WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn touch(pool: &DatabasePool, id: &str) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE scripts SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> sqlx::sqlite::SqlitePool {
        let pool = sqlx::sqlite::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE scripts (id TEXT PRIMARY KEY, name TEXT UNIQUE, description TEXT, language TEXT, file_path TEXT, input_schema TEXT, output_schema TEXT, test_status TEXT, created_at TEXT, updated_at TEXT)")
            .execute(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_find_script() {
        let pool = setup_db().await;
        let script = Script::new("script-1".to_string(), "add".to_string(), "python".to_string(), "/s.py".to_string());
        ScriptRepository::create(&pool, &script).await.unwrap();

        assert!(ScriptRepository::find_by_name(&pool, "add").await.unwrap().is_some());
        assert!(ScriptRepository::get_by_id(&pool, "script-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_script() {
        let pool = setup_db().await;
        let script = Script::new("script-1".to_string(), "add".to_string(), "python".to_string(), "/s.py".to_string());
        ScriptRepository::create(&pool, &script).await.unwrap();
        ScriptRepository::delete(&pool, "script-1").await.unwrap();
        assert!(ScriptRepository::get_by_id(&pool, "script-1").await.unwrap().is_none());
    }
}
