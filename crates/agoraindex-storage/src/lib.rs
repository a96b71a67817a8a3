//! agoraindex-storage — durable backends for aggregate rows and cursors.
//!
//! Every backend implements both `AggregateStore` (idempotent merge-upserts
//! with applied-event markers) and `CursorStore` (one resumption row per
//! indexer id).

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "memory")]
pub use memory::MemoryStorage;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
