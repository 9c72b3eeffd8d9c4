//! Database, migrations and the per-user session rows

pub mod db;
pub mod migrations;
pub mod records;
pub mod sessions;

// Re-exports for convenience
pub use db::{create_memory_pool, create_pool, get_connection, DbConnection, DbPool};
pub use sessions::{MemorySessionStore, SessionStore, SqliteSessionStore};
