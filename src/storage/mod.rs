//! Persistence implementations for the capability traits.

/// SQLite-backed storage.
pub mod sqlite;

pub use sqlite::SqliteStorage;
