// ABOUTME: Tag management system for organizing todos
// ABOUTME: Storage layer for tags with uniqueness and cascade deletion

pub mod storage;

pub use storage::TagStorage;
pub use ticklist_core::{Tag, TagCreateInput};
