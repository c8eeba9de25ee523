// ABOUTME: Type definitions for todos, tags, and their join records
// ABOUTME: Structures for create/update inputs, query filters, and stats

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    /// Calendar date only; stored as YYYY-MM-DD so it round-trips without
    /// timezone drift.
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoCreateInput {
    pub text: String,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    /// Tags to associate at creation time.
    pub tag_ids: Option<Vec<String>>,
}

/// Patch applied onto an existing todo. A present field wins; an absent
/// field retains the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoUpdateInput {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCreateInput {
    pub name: String,
    pub color: String,
}

/// Join record associating one todo with one tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoTagLink {
    pub todo_id: String,
    pub tag_id: String,
}

/// Filter for querying todos through the secondary indexes.
#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    pub completed: Option<bool>,
    pub tag_id: Option<String>,
    pub due_before: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoStats {
    pub total: i64,
    pub active: i64,
    pub completed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn priority_serializes_lowercase() {
        // The same names the TEXT column stores
        assert_eq!(serde_json::to_string(&Priority::Critical).unwrap(), "\"critical\"");
        let parsed: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }
}
