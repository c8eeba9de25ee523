// ABOUTME: Versioned JSON snapshot of the whole database
// ABOUTME: Used by the facade's export/import for backup and restore

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ticklist_core::{Tag, Todo, TodoTagLink};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub todos: Vec<Todo>,
    pub tags: Vec<Tag>,
    pub links: Vec<TodoTagLink>,
}
