//! Stream cursor — the indexer's durably persisted resumption position.
//!
//! The cursor marks the last fully-processed block. It only advances after
//! every event in a batch has been decoded, dispatched, and its upserts
//! acknowledged by the store; a failed batch is retried whole from the
//! previous cursor on reconnect. Duplicate delivery at-or-after the cursor
//! is expected and absorbed by the upsert engine's idempotence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::provider::BlockHeader;

/// The persisted resumption position for one indexer instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Last fully-processed block height.
    pub block_number: u64,
    /// Hash of that block (empty when the position is a height-only hint,
    /// e.g. a configured starting block).
    pub block_hash: String,
    /// Unix timestamp of the last save.
    pub updated_at: i64,
}

impl Cursor {
    pub fn new(block_number: u64, block_hash: impl Into<String>) -> Self {
        Self {
            block_number,
            block_hash: block_hash.into(),
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Trait for persisting cursors, one row per indexer id.
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn load(&self, indexer_id: &str) -> Result<Option<Cursor>, StoreError>;
    async fn save(&self, indexer_id: &str, cursor: &Cursor) -> Result<(), StoreError>;
    async fn delete(&self, indexer_id: &str) -> Result<(), StoreError>;
}

/// Owns the cursor for one indexer: loads it on startup and persists it
/// after each successfully applied batch.
pub struct CursorManager {
    store: std::sync::Arc<dyn CursorStore>,
    indexer_id: String,
    current: Option<Cursor>,
}

impl CursorManager {
    pub fn new(store: std::sync::Arc<dyn CursorStore>, indexer_id: impl Into<String>) -> Self {
        Self {
            store,
            indexer_id: indexer_id.into(),
            current: None,
        }
    }

    /// Load the persisted cursor into memory (returns `None` if absent).
    pub async fn load(&mut self) -> Result<Option<Cursor>, StoreError> {
        self.current = self.store.load(&self.indexer_id).await?;
        Ok(self.current.clone())
    }

    /// The in-memory cursor, if any.
    pub fn current(&self) -> Option<&Cursor> {
        self.current.as_ref()
    }

    /// Advance to `header` and persist.
    ///
    /// The cursor is monotonically non-decreasing: a commit below the
    /// current position (stale replay) is ignored.
    pub async fn commit(&mut self, header: &BlockHeader) -> Result<(), StoreError> {
        if let Some(cur) = &self.current {
            if header.block_number < cur.block_number {
                warn!(
                    at = cur.block_number,
                    got = header.block_number,
                    "ignoring cursor commit below current position"
                );
                return Ok(());
            }
        }
        let cursor = Cursor::new(header.block_number, header.block_hash.clone());
        self.store.save(&self.indexer_id, &cursor).await?;
        debug!(
            indexer = %self.indexer_id,
            block = cursor.block_number,
            "cursor committed"
        );
        self.current = Some(cursor);
        Ok(())
    }
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory cursor store for tests and ephemeral indexers.
#[derive(Default)]
pub struct MemoryCursorStore {
    data: Mutex<HashMap<String, Cursor>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&self, indexer_id: &str) -> Result<Option<Cursor>, StoreError> {
        Ok(self.data.lock().unwrap().get(indexer_id).cloned())
    }

    async fn save(&self, indexer_id: &str, cursor: &Cursor) -> Result<(), StoreError> {
        self.data
            .lock()
            .unwrap()
            .insert(indexer_id.to_string(), cursor.clone());
        Ok(())
    }

    async fn delete(&self, indexer_id: &str) -> Result<(), StoreError> {
        self.data.lock().unwrap().remove(indexer_id);
        Ok(())
    }
}
