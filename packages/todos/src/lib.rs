// ABOUTME: Todo persistence: record storage, tag relationships, service facade
// ABOUTME: TodoService is the single entry point applications should use

pub mod links;
pub mod service;
pub mod snapshot;
pub mod storage;

pub use links::LinkStorage;
pub use service::{ServiceError, ServiceResult, TodoService};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use storage::TodoStorage;

pub use ticklist_core::{
    Priority, Tag, TagCreateInput, Todo, TodoCreateInput, TodoFilter, TodoStats, TodoUpdateInput,
};
