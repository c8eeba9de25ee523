// ABOUTME: Persistence service facade: the single entry point for applications
// ABOUTME: Owns validation, error translation, seeding, and snapshot export/import

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use ticklist_core::{
    validate_color, validate_due_date, validate_tag_name, validate_todo_text, Tag, TagCreateInput,
    Todo, TodoCreateInput, TodoFilter, TodoStats, TodoUpdateInput, ValidationError,
};
use ticklist_storage::{StorageConfig, StorageError};
use ticklist_tags::TagStorage;

use crate::links::LinkStorage;
use crate::snapshot::{Snapshot, SNAPSHOT_VERSION};
use crate::storage::TodoStorage;

/// Tags seeded on first run, matching a fresh install's starter set.
const DEFAULT_TAGS: &[(&str, &str)] = &[
    ("Work", "#1976d2"),
    ("Personal", "#388e3c"),
    ("Urgent", "#d32f2f"),
    ("Ideas", "#7b1fa2"),
];

/// Facade errors. Storage failures never escape in raw form; anything
/// unexpected is wrapped with the name of the failing operation.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Tag with name '{0}' already exists")]
    DuplicateName(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Operation '{operation}' failed: {source}")]
    OperationFailed {
        operation: &'static str,
        source: StorageError,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Translate a storage failure at the facade boundary.
fn translate(operation: &'static str, err: StorageError) -> ServiceError {
    match err {
        StorageError::DuplicateName(name) => ServiceError::DuplicateName(name),
        StorageError::Unavailable(msg) => ServiceError::Unavailable(msg),
        source => ServiceError::OperationFailed { operation, source },
    }
}

/// The public persistence service. Construct one explicitly and inject it
/// into consumers; there is no global instance.
pub struct TodoService {
    pool: SqlitePool,
    todos: TodoStorage,
    tags: TagStorage,
    links: LinkStorage,
}

impl TodoService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            todos: TodoStorage::new(pool.clone()),
            tags: TagStorage::new(pool.clone()),
            links: LinkStorage::new(pool.clone()),
            pool,
        }
    }

    /// Open the configured database, run migrations, and seed default tags
    /// on first run.
    pub async fn open(config: &StorageConfig) -> ServiceResult<Self> {
        let pool = ticklist_storage::connect(config)
            .await
            .map_err(|e| translate("open", e))?;

        let service = Self::new(pool);
        service.seed_default_tags().await?;

        info!("Todo service ready at {}", config.path.display());
        Ok(service)
    }

    /// In-memory service, seeded like a fresh install.
    pub async fn open_in_memory() -> ServiceResult<Self> {
        let pool = ticklist_storage::connect_in_memory()
            .await
            .map_err(|e| translate("open", e))?;

        let service = Self::new(pool);
        service.seed_default_tags().await?;
        Ok(service)
    }

    /// Insert the starter tags when the tag table is empty.
    pub async fn seed_default_tags(&self) -> ServiceResult<()> {
        let count = self
            .tags
            .count_tags()
            .await
            .map_err(|e| translate("seed_default_tags", e))?;

        if count > 0 {
            return Ok(());
        }

        debug!("Seeding {} default tags", DEFAULT_TAGS.len());
        for (name, color) in DEFAULT_TAGS {
            self.tags
                .create_tag(TagCreateInput {
                    name: name.to_string(),
                    color: color.to_string(),
                })
                .await
                .map_err(|e| translate("seed_default_tags", e))?;
        }

        Ok(())
    }

    // ----- Todo operations -----

    /// Create a todo and associate any requested tags. Text and due date are
    /// validated first; every tag id must refer to an existing tag.
    pub async fn create_todo(&self, input: TodoCreateInput) -> ServiceResult<Todo> {
        validate_todo_text(&input.text)?;
        validate_due_date(input.due_date)?;

        let tag_ids = input.tag_ids.clone().unwrap_or_default();
        for tag_id in &tag_ids {
            if self
                .tags
                .get_tag(tag_id)
                .await
                .map_err(|e| translate("create_todo", e))?
                .is_none()
            {
                return Err(ServiceError::NotFound(tag_id.clone()));
            }
        }

        let todo = self
            .todos
            .create_todo(&input)
            .await
            .map_err(|e| translate("create_todo", e))?;

        for tag_id in &tag_ids {
            self.links
                .link(&todo.id, tag_id)
                .await
                .map_err(|e| translate("create_todo", e))?;
        }

        Ok(todo)
    }

    /// All todos, newest first. The ordering is this facade's contract, so
    /// it is re-applied here rather than trusted to the storage scan.
    pub async fn get_all_todos(&self) -> ServiceResult<Vec<Todo>> {
        let mut todos = self
            .todos
            .list_todos(&TodoFilter::default())
            .await
            .map_err(|e| translate("get_all_todos", e))?;

        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    /// Filtered listing over the secondary indexes, newest first.
    pub async fn list_todos(&self, filter: &TodoFilter) -> ServiceResult<Vec<Todo>> {
        let mut todos = self
            .todos
            .list_todos(filter)
            .await
            .map_err(|e| translate("list_todos", e))?;

        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    /// Absence is not an error.
    pub async fn get_todo(&self, todo_id: &str) -> ServiceResult<Option<Todo>> {
        self.todos
            .get_todo(todo_id)
            .await
            .map_err(|e| translate("get_todo", e))
    }

    /// Patch an existing todo; fails with `NotFound` for an unknown id.
    pub async fn update_todo(
        &self,
        todo_id: &str,
        input: TodoUpdateInput,
    ) -> ServiceResult<Todo> {
        if let Some(text) = &input.text {
            validate_todo_text(text)?;
        }

        match self.todos.update_todo(todo_id, &input).await {
            Ok(todo) => Ok(todo),
            Err(StorageError::NotFound) => Err(ServiceError::NotFound(todo_id.to_string())),
            Err(e) => Err(translate("update_todo", e)),
        }
    }

    /// Idempotent; cascades link deletion in the same transaction.
    pub async fn delete_todo(&self, todo_id: &str) -> ServiceResult<()> {
        self.todos
            .delete_todo(todo_id)
            .await
            .map_err(|e| translate("delete_todo", e))
    }

    /// Flip completion state; fails with `NotFound` for an unknown id.
    pub async fn toggle_completed(&self, todo_id: &str) -> ServiceResult<Todo> {
        let todo = self
            .get_todo(todo_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(todo_id.to_string()))?;

        self.update_todo(
            todo_id,
            TodoUpdateInput {
                completed: Some(!todo.completed),
                ..TodoUpdateInput::default()
            },
        )
        .await
    }

    pub async fn stats(&self) -> ServiceResult<TodoStats> {
        self.todos.stats().await.map_err(|e| translate("stats", e))
    }

    // ----- Tag operations -----

    pub async fn create_tag(&self, input: TagCreateInput) -> ServiceResult<Tag> {
        validate_tag_name(&input.name)?;
        validate_color(&input.color)?;

        if self
            .tags
            .get_tag_by_name(&input.name)
            .await
            .map_err(|e| translate("create_tag", e))?
            .is_some()
        {
            return Err(ServiceError::DuplicateName(input.name));
        }

        self.tags
            .create_tag(input)
            .await
            .map_err(|e| translate("create_tag", e))
    }

    /// All tags in name order.
    pub async fn get_all_tags(&self) -> ServiceResult<Vec<Tag>> {
        self.tags
            .list_tags()
            .await
            .map_err(|e| translate("get_all_tags", e))
    }

    /// Idempotent; cascades link deletion in the same transaction.
    pub async fn delete_tag(&self, tag_id: &str) -> ServiceResult<()> {
        self.tags
            .delete_tag(tag_id)
            .await
            .map_err(|e| translate("delete_tag", e))
    }

    // ----- Relationships -----

    /// Associate a tag with a todo. Both sides must exist; linking an
    /// already-linked pair is a no-op.
    pub async fn add_tag_to_todo(&self, todo_id: &str, tag_id: &str) -> ServiceResult<()> {
        if self.get_todo(todo_id).await?.is_none() {
            return Err(ServiceError::NotFound(todo_id.to_string()));
        }
        if self
            .tags
            .get_tag(tag_id)
            .await
            .map_err(|e| translate("add_tag_to_todo", e))?
            .is_none()
        {
            return Err(ServiceError::NotFound(tag_id.to_string()));
        }

        self.links
            .link(todo_id, tag_id)
            .await
            .map_err(|e| translate("add_tag_to_todo", e))
    }

    /// Idempotent disassociation.
    pub async fn remove_tag_from_todo(&self, todo_id: &str, tag_id: &str) -> ServiceResult<()> {
        self.links
            .unlink(todo_id, tag_id)
            .await
            .map_err(|e| translate("remove_tag_from_todo", e))
    }

    /// Two-hop lookup: link records, then the tags they reference.
    /// Returns an empty list when nothing is linked.
    pub async fn tags_for_todo(&self, todo_id: &str) -> ServiceResult<Vec<Tag>> {
        let tag_ids = self
            .links
            .tag_ids_for_todo(todo_id)
            .await
            .map_err(|e| translate("tags_for_todo", e))?;

        self.tags
            .get_tags_by_ids(&tag_ids)
            .await
            .map_err(|e| translate("tags_for_todo", e))
    }

    /// Two-hop lookup in the other direction, newest first.
    pub async fn todos_for_tag(&self, tag_id: &str) -> ServiceResult<Vec<Todo>> {
        let todo_ids = self
            .links
            .todo_ids_for_tag(tag_id)
            .await
            .map_err(|e| translate("todos_for_tag", e))?;

        self.todos
            .get_todos_by_ids(&todo_ids)
            .await
            .map_err(|e| translate("todos_for_tag", e))
    }

    // ----- Bulk operations -----

    /// Remove every completed todo and its links atomically; returns the
    /// number of todos removed.
    pub async fn clear_completed_todos(&self) -> ServiceResult<u64> {
        self.todos
            .clear_completed()
            .await
            .map_err(|e| translate("clear_completed_todos", e))
    }

    /// Remove every todo and every link; tags survive.
    pub async fn delete_all_todos(&self) -> ServiceResult<()> {
        self.todos
            .delete_all()
            .await
            .map_err(|e| translate("delete_all_todos", e))
    }

    /// Wipe todos, links, and tags in one transaction.
    pub async fn reset(&self) -> ServiceResult<()> {
        let result: Result<(), StorageError> = async {
            let mut tx = self.pool.begin().await?;
            sqlx::query("DELETE FROM todo_tags").execute(&mut *tx).await?;
            sqlx::query("DELETE FROM todos").execute(&mut *tx).await?;
            sqlx::query("DELETE FROM tags").execute(&mut *tx).await?;
            tx.commit().await?;
            Ok(())
        }
        .await;

        result.map_err(|e| translate("reset", e))
    }

    // ----- Snapshot export/import -----

    /// Serialize the whole database to a versioned JSON snapshot.
    pub async fn export_snapshot(&self) -> ServiceResult<String> {
        let todos = self
            .todos
            .list_todos(&TodoFilter::default())
            .await
            .map_err(|e| translate("export_snapshot", e))?;
        let tags = self
            .tags
            .list_tags()
            .await
            .map_err(|e| translate("export_snapshot", e))?;
        let links = self
            .links
            .list_links()
            .await
            .map_err(|e| translate("export_snapshot", e))?;

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            todos,
            tags,
            links,
        };

        serde_json::to_string_pretty(&snapshot)
            .map_err(|e| translate("export_snapshot", StorageError::Json(e)))
    }

    /// Replace the entire database contents with a snapshot, atomically.
    /// Record ids and timestamps are restored as exported.
    pub async fn import_snapshot(&self, data: &str) -> ServiceResult<()> {
        let snapshot: Snapshot = serde_json::from_str(data)
            .map_err(|e| translate("import_snapshot", StorageError::Json(e)))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ServiceError::Validation(ValidationError::new(
                "version",
                format!("Unsupported snapshot version: {}", snapshot.version),
            )));
        }

        let result: Result<(), StorageError> = async {
            let mut tx = self.pool.begin().await?;

            sqlx::query("DELETE FROM todo_tags").execute(&mut *tx).await?;
            sqlx::query("DELETE FROM todos").execute(&mut *tx).await?;
            sqlx::query("DELETE FROM tags").execute(&mut *tx).await?;

            for tag in &snapshot.tags {
                sqlx::query("INSERT INTO tags (id, name, color, created_at) VALUES (?, ?, ?, ?)")
                    .bind(&tag.id)
                    .bind(&tag.name)
                    .bind(&tag.color)
                    .bind(tag.created_at)
                    .execute(&mut *tx)
                    .await?;
            }

            for todo in &snapshot.todos {
                sqlx::query(
                    r#"
                    INSERT INTO todos (id, text, completed, priority, due_date, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&todo.id)
                .bind(&todo.text)
                .bind(todo.completed)
                .bind(todo.priority)
                .bind(todo.due_date)
                .bind(todo.created_at)
                .bind(todo.updated_at)
                .execute(&mut *tx)
                .await?;
            }

            for link in &snapshot.links {
                sqlx::query("INSERT INTO todo_tags (todo_id, tag_id) VALUES (?, ?)")
                    .bind(&link.todo_id)
                    .bind(&link.tag_id)
                    .execute(&mut *tx)
                    .await?;
            }

            tx.commit().await?;
            Ok(())
        }
        .await;

        result.map_err(|e| translate("import_snapshot", e))?;

        info!(
            "Imported snapshot: {} todos, {} tags, {} links",
            snapshot.todos.len(),
            snapshot.tags.len(),
            snapshot.links.len()
        );
        Ok(())
    }
}
