// ABOUTME: Tag storage layer using SQLite
// ABOUTME: Handles tag CRUD with unique names and link cascade on delete

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use ticklist_core::{Tag, TagCreateInput};
use ticklist_storage::StorageError;

pub struct TagStorage {
    pool: SqlitePool,
}

impl TagStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all tags ordered by name
    pub async fn list_tags(&self) -> Result<Vec<Tag>, StorageError> {
        debug!("Fetching all tags");

        let rows = sqlx::query("SELECT * FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_tag).collect()
    }

    /// Get a single tag by ID; absence is not an error
    pub async fn get_tag(&self, tag_id: &str) -> Result<Option<Tag>, StorageError> {
        debug!("Fetching tag: {}", tag_id);

        let row = sqlx::query("SELECT * FROM tags WHERE id = ?")
            .bind(tag_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(r) => Ok(Some(row_to_tag(&r)?)),
            None => Ok(None),
        }
    }

    /// Get a tag by its unique name (case-sensitive)
    pub async fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>, StorageError> {
        debug!("Fetching tag by name: {}", name);

        let row = sqlx::query("SELECT * FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(r) => Ok(Some(row_to_tag(&r)?)),
            None => Ok(None),
        }
    }

    /// Resolve a set of tag ids to tags, ordered by name. Unknown ids are
    /// skipped, so the result may be shorter than the input.
    pub async fn get_tags_by_ids(&self, tag_ids: &[String]) -> Result<Vec<Tag>, StorageError> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; tag_ids.len()].join(", ");
        let query_str = format!(
            "SELECT * FROM tags WHERE id IN ({}) ORDER BY name",
            placeholders
        );

        let mut query = sqlx::query(&query_str);
        for id in tag_ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_tag).collect()
    }

    pub async fn count_tags(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(count)
    }

    /// Create a new tag. A name collision surfaces as `DuplicateName`.
    pub async fn create_tag(&self, input: TagCreateInput) -> Result<Tag, StorageError> {
        let tag_id = format!("tag-{}", nanoid::nanoid!());
        let now = Utc::now();

        debug!("Creating tag: {} (name: {})", tag_id, input.name);

        sqlx::query(
            r#"
            INSERT INTO tags (id, name, color, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&tag_id)
        .bind(&input.name)
        .bind(&input.color)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StorageError::DuplicateName(input.name.clone())
            }
            _ => StorageError::Sqlx(e),
        })?;

        self.get_tag(&tag_id).await?.ok_or(StorageError::NotFound)
    }

    /// Delete a tag and every link that references it, atomically.
    /// Deleting a missing tag is a no-op.
    pub async fn delete_tag(&self, tag_id: &str) -> Result<(), StorageError> {
        debug!("Deleting tag: {}", tag_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM todo_tags WHERE tag_id = ?")
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(())
    }
}

fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Result<Tag, StorageError> {
    Ok(Tag {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        name: row.try_get("name").map_err(StorageError::Sqlx)?,
        color: row.try_get("color").map_err(StorageError::Sqlx)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
    })
}
