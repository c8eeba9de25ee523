// ABOUTME: Core domain types and pure helpers for ticklist
// ABOUTME: Shared by the storage layers and the service facade

pub mod dates;
pub mod types;
pub mod validation;

pub use types::{
    Priority, Tag, TagCreateInput, Todo, TodoCreateInput, TodoFilter, TodoStats, TodoTagLink,
    TodoUpdateInput,
};
pub use validation::{
    validate_color, validate_due_date, validate_tag_name, validate_todo_text, ValidationError,
};
