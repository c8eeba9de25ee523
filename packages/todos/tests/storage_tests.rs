// ABOUTME: Integration tests for todo and link storage
// ABOUTME: Covers CRUD, patch merges, indexed filters, and cascade transactions

use chrono::{Duration, Utc};
use ticklist_core::{Priority, TodoCreateInput, TodoFilter, TodoUpdateInput};
use ticklist_storage::StorageError;
use ticklist_todos::{LinkStorage, TodoStorage};

async fn create_test_db() -> sqlx::SqlitePool {
    ticklist_storage::connect_in_memory().await.unwrap()
}

fn input(text: &str) -> TodoCreateInput {
    TodoCreateInput {
        text: text.to_string(),
        priority: None,
        due_date: None,
        tag_ids: None,
    }
}

#[tokio::test]
async fn test_create_and_get_todo() {
    let pool = create_test_db().await;
    let storage = TodoStorage::new(pool);

    let due = Utc::now().date_naive() + Duration::days(3);
    let todo = storage
        .create_todo(&TodoCreateInput {
            text: "Write report".to_string(),
            priority: Some(Priority::High),
            due_date: Some(due),
            tag_ids: None,
        })
        .await
        .unwrap();

    assert!(todo.id.starts_with("todo-"));
    assert_eq!(todo.text, "Write report");
    assert_eq!(todo.priority, Priority::High);
    assert_eq!(todo.due_date, Some(due));
    assert!(!todo.completed);
    assert_eq!(todo.created_at, todo.updated_at);

    let fetched = storage.get_todo(&todo.id).await.unwrap().unwrap();
    assert_eq!(fetched, todo);

    assert!(storage.get_todo("todo-missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_priority_defaults_to_medium() {
    let pool = create_test_db().await;
    let storage = TodoStorage::new(pool);

    let todo = storage.create_todo(&input("Default prio")).await.unwrap();
    assert_eq!(todo.priority, Priority::Medium);
}

#[tokio::test]
async fn test_update_is_a_patch_merge() {
    let pool = create_test_db().await;
    let storage = TodoStorage::new(pool);

    let due = Utc::now().date_naive() + Duration::days(1);
    let created = storage
        .create_todo(&TodoCreateInput {
            text: "Original".to_string(),
            priority: Some(Priority::Low),
            due_date: Some(due),
            tag_ids: None,
        })
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    // Only flip completion; everything else must survive.
    let updated = storage
        .update_todo(
            &created.id,
            &TodoUpdateInput {
                completed: Some(true),
                ..TodoUpdateInput::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.completed);
    assert_eq!(updated.text, "Original");
    assert_eq!(updated.priority, Priority::Low);
    assert_eq!(updated.due_date, Some(due));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn test_update_can_clear_due_date() {
    let pool = create_test_db().await;
    let storage = TodoStorage::new(pool);

    let due = Utc::now().date_naive();
    let created = storage
        .create_todo(&TodoCreateInput {
            text: "Dated".to_string(),
            priority: None,
            due_date: Some(due),
            tag_ids: None,
        })
        .await
        .unwrap();

    let updated = storage
        .update_todo(
            &created.id,
            &TodoUpdateInput {
                due_date: Some(None),
                ..TodoUpdateInput::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.due_date, None);
}

#[tokio::test]
async fn test_update_missing_todo_is_not_found() {
    let pool = create_test_db().await;
    let storage = TodoStorage::new(pool);

    let result = storage
        .update_todo(
            "todo-missing",
            &TodoUpdateInput {
                completed: Some(true),
                ..TodoUpdateInput::default()
            },
        )
        .await;

    assert!(matches!(result, Err(StorageError::NotFound)));
}

#[tokio::test]
async fn test_delete_todo_cascades_links_and_is_idempotent() {
    let pool = create_test_db().await;
    let storage = TodoStorage::new(pool.clone());
    let links = LinkStorage::new(pool.clone());

    let todo = storage.create_todo(&input("Linked")).await.unwrap();
    links.link(&todo.id, "tag-1").await.unwrap();
    links.link(&todo.id, "tag-2").await.unwrap();

    storage.delete_todo(&todo.id).await.unwrap();

    assert!(storage.get_todo(&todo.id).await.unwrap().is_none());
    assert!(links.tag_ids_for_todo(&todo.id).await.unwrap().is_empty());

    // Deleting again is not an error
    storage.delete_todo(&todo.id).await.unwrap();
}

#[tokio::test]
async fn test_list_todos_filters() {
    let pool = create_test_db().await;
    let storage = TodoStorage::new(pool.clone());
    let links = LinkStorage::new(pool.clone());

    let today = Utc::now().date_naive();
    let a = storage
        .create_todo(&TodoCreateInput {
            text: "A".to_string(),
            priority: None,
            due_date: Some(today + Duration::days(1)),
            tag_ids: None,
        })
        .await
        .unwrap();
    let b = storage
        .create_todo(&TodoCreateInput {
            text: "B".to_string(),
            priority: None,
            due_date: Some(today + Duration::days(10)),
            tag_ids: None,
        })
        .await
        .unwrap();
    let c = storage.create_todo(&input("C")).await.unwrap();

    storage
        .update_todo(
            &b.id,
            &TodoUpdateInput {
                completed: Some(true),
                ..TodoUpdateInput::default()
            },
        )
        .await
        .unwrap();
    links.link(&a.id, "tag-work").await.unwrap();
    links.link(&c.id, "tag-work").await.unwrap();

    let active = storage
        .list_todos(&TodoFilter {
            completed: Some(false),
            ..TodoFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|t| !t.completed));

    let completed = storage
        .list_todos(&TodoFilter {
            completed: Some(true),
            ..TodoFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, b.id);

    let tagged = storage
        .list_todos(&TodoFilter {
            tag_id: Some("tag-work".to_string()),
            ..TodoFilter::default()
        })
        .await
        .unwrap();
    let tagged_ids: Vec<&str> = tagged.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(tagged.len(), 2);
    assert!(tagged_ids.contains(&a.id.as_str()));
    assert!(tagged_ids.contains(&c.id.as_str()));

    let due_soon = storage
        .list_todos(&TodoFilter {
            due_before: Some(today + Duration::days(5)),
            ..TodoFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(due_soon.len(), 1);
    assert_eq!(due_soon[0].id, a.id);
}

#[tokio::test]
async fn test_clear_completed_removes_todos_and_links() {
    let pool = create_test_db().await;
    let storage = TodoStorage::new(pool.clone());
    let links = LinkStorage::new(pool.clone());

    let keep = storage.create_todo(&input("Keep")).await.unwrap();
    let done = storage.create_todo(&input("Done")).await.unwrap();
    links.link(&keep.id, "tag-1").await.unwrap();
    links.link(&done.id, "tag-1").await.unwrap();

    storage
        .update_todo(
            &done.id,
            &TodoUpdateInput {
                completed: Some(true),
                ..TodoUpdateInput::default()
            },
        )
        .await
        .unwrap();

    let removed = storage.clear_completed().await.unwrap();
    assert_eq!(removed, 1);

    assert!(storage.get_todo(&done.id).await.unwrap().is_none());
    assert!(links.tag_ids_for_todo(&done.id).await.unwrap().is_empty());

    // The active todo and its link survive
    assert!(storage.get_todo(&keep.id).await.unwrap().is_some());
    assert_eq!(links.tag_ids_for_todo(&keep.id).await.unwrap().len(), 1);

    // Nothing left to clear
    assert_eq!(storage.clear_completed().await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_all_leaves_tags_alone() {
    let pool = create_test_db().await;
    let storage = TodoStorage::new(pool.clone());
    let links = LinkStorage::new(pool.clone());

    sqlx::query("INSERT INTO tags (id, name, color, created_at) VALUES (?, ?, ?, ?)")
        .bind("tag-1")
        .bind("Work")
        .bind("#1976d2")
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

    let todo = storage.create_todo(&input("Gone soon")).await.unwrap();
    links.link(&todo.id, "tag-1").await.unwrap();

    storage.delete_all().await.unwrap();

    assert_eq!(storage.stats().await.unwrap().total, 0);
    assert!(links.tag_ids_for_todo(&todo.id).await.unwrap().is_empty());

    let tags: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(tags, 1);
}

#[tokio::test]
async fn test_stats_counts() {
    let pool = create_test_db().await;
    let storage = TodoStorage::new(pool);

    for i in 0..3 {
        storage.create_todo(&input(&format!("t{}", i))).await.unwrap();
    }
    let done = storage.create_todo(&input("done")).await.unwrap();
    storage
        .update_todo(
            &done.id,
            &TodoUpdateInput {
                completed: Some(true),
                ..TodoUpdateInput::default()
            },
        )
        .await
        .unwrap();

    let stats = storage.stats().await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.active, 3);
    assert_eq!(stats.completed, 1);
}

#[tokio::test]
async fn test_link_is_idempotent() {
    let pool = create_test_db().await;
    let links = LinkStorage::new(pool.clone());

    links.link("todo-1", "tag-1").await.unwrap();
    links.link("todo-1", "tag-1").await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todo_tags")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    // Unlink twice: second call is a no-op
    links.unlink("todo-1", "tag-1").await.unwrap();
    links.unlink("todo-1", "tag-1").await.unwrap();
    assert!(links.tag_ids_for_todo("todo-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_link_lookup_both_directions() {
    let pool = create_test_db().await;
    let links = LinkStorage::new(pool);

    links.link("todo-1", "tag-a").await.unwrap();
    links.link("todo-1", "tag-b").await.unwrap();
    links.link("todo-2", "tag-a").await.unwrap();

    let mut tags = links.tag_ids_for_todo("todo-1").await.unwrap();
    tags.sort();
    assert_eq!(tags, vec!["tag-a".to_string(), "tag-b".to_string()]);

    let mut todos = links.todo_ids_for_tag("tag-a").await.unwrap();
    todos.sort();
    assert_eq!(todos, vec!["todo-1".to_string(), "todo-2".to_string()]);

    assert!(links.todo_ids_for_tag("tag-none").await.unwrap().is_empty());

    assert_eq!(links.list_links().await.unwrap().len(), 3);
}
