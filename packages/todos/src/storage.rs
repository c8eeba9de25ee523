// ABOUTME: Todo storage layer using SQLite
// ABOUTME: CRUD, indexed filter queries, and transactional cascade deletes

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use ticklist_core::{Todo, TodoCreateInput, TodoFilter, TodoStats, TodoUpdateInput};
use ticklist_storage::StorageError;

pub struct TodoStorage {
    pool: SqlitePool,
}

impl TodoStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List todos matching `filter`, newest first. Each filter field compiles
    /// to a clause against one of the secondary indexes.
    pub async fn list_todos(&self, filter: &TodoFilter) -> Result<Vec<Todo>, StorageError> {
        debug!("Fetching todos with filter: {:?}", filter);

        let mut query_str = String::from("SELECT * FROM todos WHERE 1 = 1");

        if filter.completed.is_some() {
            query_str.push_str(" AND completed = ?");
        }
        if filter.tag_id.is_some() {
            query_str.push_str(" AND id IN (SELECT todo_id FROM todo_tags WHERE tag_id = ?)");
        }
        if filter.due_before.is_some() {
            query_str.push_str(" AND due_date IS NOT NULL AND due_date < ?");
        }

        query_str.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query(&query_str);
        if let Some(completed) = filter.completed {
            query = query.bind(completed);
        }
        if let Some(tag_id) = &filter.tag_id {
            query = query.bind(tag_id);
        }
        if let Some(due_before) = filter.due_before {
            query = query.bind(due_before);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_todo).collect()
    }

    /// Get a single todo by ID; absence is not an error
    pub async fn get_todo(&self, todo_id: &str) -> Result<Option<Todo>, StorageError> {
        debug!("Fetching todo: {}", todo_id);

        let row = sqlx::query("SELECT * FROM todos WHERE id = ?")
            .bind(todo_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(r) => Ok(Some(row_to_todo(&r)?)),
            None => Ok(None),
        }
    }

    /// Resolve a set of todo ids, newest first. Unknown ids are skipped.
    pub async fn get_todos_by_ids(&self, todo_ids: &[String]) -> Result<Vec<Todo>, StorageError> {
        if todo_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; todo_ids.len()].join(", ");
        let query_str = format!(
            "SELECT * FROM todos WHERE id IN ({}) ORDER BY created_at DESC",
            placeholders
        );

        let mut query = sqlx::query(&query_str);
        for id in todo_ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_todo).collect()
    }

    /// Create a new todo. Timestamps are assigned here; the input carries
    /// none, so callers cannot supply their own.
    pub async fn create_todo(&self, input: &TodoCreateInput) -> Result<Todo, StorageError> {
        let todo_id = format!("todo-{}", nanoid::nanoid!());
        let now = Utc::now();
        let priority = input.priority.unwrap_or_default();

        debug!("Creating todo: {}", todo_id);

        sqlx::query(
            r#"
            INSERT INTO todos (id, text, completed, priority, due_date, created_at, updated_at)
            VALUES (?, ?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(&todo_id)
        .bind(&input.text)
        .bind(priority)
        .bind(input.due_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_todo(&todo_id).await?.ok_or(StorageError::NotFound)
    }

    /// Apply a patch to an existing todo. Present fields win, absent fields
    /// keep their stored value, and `updated_at` always refreshes.
    pub async fn update_todo(
        &self,
        todo_id: &str,
        input: &TodoUpdateInput,
    ) -> Result<Todo, StorageError> {
        debug!("Updating todo: {}", todo_id);

        let mut query_str = String::from("UPDATE todos SET updated_at = ?");

        if input.text.is_some() {
            query_str.push_str(", text = ?");
        }
        if input.completed.is_some() {
            query_str.push_str(", completed = ?");
        }
        if input.priority.is_some() {
            query_str.push_str(", priority = ?");
        }
        if input.due_date.is_some() {
            query_str.push_str(", due_date = ?");
        }

        query_str.push_str(" WHERE id = ?");

        let now = Utc::now();
        let mut query = sqlx::query(&query_str).bind(now);

        if let Some(text) = &input.text {
            query = query.bind(text);
        }
        if let Some(completed) = input.completed {
            query = query.bind(completed);
        }
        if let Some(priority) = input.priority {
            query = query.bind(priority);
        }
        if let Some(due_date) = input.due_date {
            // Outer Some means "set the field"; the inner Option may be None
            // to clear the due date.
            query = query.bind(due_date);
        }

        query = query.bind(todo_id);

        let result = query
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_todo(todo_id).await?.ok_or(StorageError::NotFound)
    }

    /// Delete a todo and every link that references it, atomically.
    /// Deleting a missing todo is a no-op.
    pub async fn delete_todo(&self, todo_id: &str) -> Result<(), StorageError> {
        debug!("Deleting todo: {}", todo_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM todo_tags WHERE todo_id = ?")
            .bind(todo_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(todo_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Delete every completed todo together with its links. The affected id
    /// set is computed first, then both tables are purged in one transaction.
    pub async fn clear_completed(&self) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let completed_ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM todos WHERE completed = 1")
                .fetch_all(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;

        if completed_ids.is_empty() {
            tx.commit().await.map_err(StorageError::Sqlx)?;
            return Ok(0);
        }

        debug!("Clearing {} completed todos", completed_ids.len());

        let placeholders = vec!["?"; completed_ids.len()].join(", ");
        let links_sql = format!("DELETE FROM todo_tags WHERE todo_id IN ({})", placeholders);
        let todos_sql = format!("DELETE FROM todos WHERE id IN ({})", placeholders);

        let mut links_query = sqlx::query(&links_sql);
        for id in &completed_ids {
            links_query = links_query.bind(id);
        }
        links_query
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut todos_query = sqlx::query(&todos_sql);
        for id in &completed_ids {
            todos_query = todos_query.bind(id);
        }
        let result = todos_query
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected())
    }

    /// Delete all todos and all links in one transaction. Tags survive.
    pub async fn delete_all(&self) -> Result<(), StorageError> {
        debug!("Deleting all todos");

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM todo_tags")
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM todos")
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(())
    }

    pub async fn stats(&self) -> Result<TodoStats, StorageError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let completed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE completed = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(TodoStats {
            total,
            active: total - completed,
            completed,
        })
    }
}

fn row_to_todo(row: &sqlx::sqlite::SqliteRow) -> Result<Todo, StorageError> {
    Ok(Todo {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        text: row.try_get("text").map_err(StorageError::Sqlx)?,
        completed: row.try_get("completed").map_err(StorageError::Sqlx)?,
        priority: row.try_get("priority").map_err(StorageError::Sqlx)?,
        due_date: row.try_get("due_date").map_err(StorageError::Sqlx)?,
        created_at: row.try_get("created_at").map_err(StorageError::Sqlx)?,
        updated_at: row.try_get("updated_at").map_err(StorageError::Sqlx)?,
    })
}
