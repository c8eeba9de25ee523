// ABOUTME: Relationship layer for the todo/tag many-to-many association
// ABOUTME: Link and unlink are idempotent against the composite-unique key

use sqlx::SqlitePool;
use tracing::debug;

use ticklist_core::TodoTagLink;
use ticklist_storage::StorageError;

pub struct LinkStorage {
    pool: SqlitePool,
}

impl LinkStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Associate a todo with a tag. Linking an already-linked pair is a
    /// no-op; exactly one link record exists per pair.
    pub async fn link(&self, todo_id: &str, tag_id: &str) -> Result<(), StorageError> {
        debug!("Linking todo {} to tag {}", todo_id, tag_id);

        sqlx::query("INSERT OR IGNORE INTO todo_tags (todo_id, tag_id) VALUES (?, ?)")
            .bind(todo_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Remove the association; absent pairs are a no-op.
    pub async fn unlink(&self, todo_id: &str, tag_id: &str) -> Result<(), StorageError> {
        debug!("Unlinking todo {} from tag {}", todo_id, tag_id);

        sqlx::query("DELETE FROM todo_tags WHERE todo_id = ? AND tag_id = ?")
            .bind(todo_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// First hop of tags-for-todo: collect the linked tag ids.
    pub async fn tag_ids_for_todo(&self, todo_id: &str) -> Result<Vec<String>, StorageError> {
        let ids = sqlx::query_scalar("SELECT tag_id FROM todo_tags WHERE todo_id = ?")
            .bind(todo_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(ids)
    }

    /// First hop of todos-for-tag: collect the linked todo ids.
    pub async fn todo_ids_for_tag(&self, tag_id: &str) -> Result<Vec<String>, StorageError> {
        let ids = sqlx::query_scalar("SELECT todo_id FROM todo_tags WHERE tag_id = ?")
            .bind(tag_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(ids)
    }

    /// All link records, used by snapshot export.
    pub async fn list_links(&self) -> Result<Vec<TodoTagLink>, StorageError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT todo_id, tag_id FROM todo_tags ORDER BY todo_id, tag_id")
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

        Ok(rows
            .into_iter()
            .map(|(todo_id, tag_id)| TodoTagLink { todo_id, tag_id })
            .collect())
    }
}
