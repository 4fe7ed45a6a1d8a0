//! Snapshot storage adapters for aggregate repositories.

pub mod in_memory;

pub use in_memory::{InMemoryRepository, StoredSnapshot};
