//! Persistence layer: the [`AuditStore`] trait and its `SQLite` backing.

pub mod schema;
pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStore;
pub use traits::AuditStore;
