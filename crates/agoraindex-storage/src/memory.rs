//! In-memory storage backend.
//!
//! Keeps aggregate rows, applied-event markers, and cursors in RAM.
//! Useful for tests and short-lived indexers that don't need persistence.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use agoraindex_core::{
    AggregateRow, AggregateStore, ApplyOutcome, Cursor, CursorStore, EntityKind, EntityUpsert,
    StoreError,
};

#[derive(Default)]
struct Inner {
    rows: HashMap<(EntityKind, String), AggregateRow>,
    applied: HashSet<(String, EntityKind, String)>,
    cursors: HashMap<String, Cursor>,
}

/// In-memory aggregate + cursor storage.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialized rows across all entities.
    pub fn row_count(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }

    /// Number of recorded applied-event markers.
    pub fn marker_count(&self) -> usize {
        self.inner.lock().unwrap().applied.len()
    }
}

#[async_trait]
impl AggregateStore for MemoryStorage {
    async fn apply(&self, upsert: &EntityUpsert) -> Result<ApplyOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let marker = (upsert.event_id(), upsert.entity, upsert.key.clone());
        if inner.applied.contains(&marker) {
            return Ok(ApplyOutcome::Duplicate);
        }
        let row = inner
            .rows
            .entry((upsert.entity, upsert.key.clone()))
            .or_default();
        row.merge(upsert);
        row.updated_at = chrono::Utc::now().timestamp();
        inner.applied.insert(marker);
        Ok(ApplyOutcome::Applied)
    }

    async fn fetch(
        &self,
        entity: EntityKind,
        key: &str,
    ) -> Result<Option<AggregateRow>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .rows
            .get(&(entity, key.to_string()))
            .cloned())
    }
}

#[async_trait]
impl CursorStore for MemoryStorage {
    async fn load(&self, indexer_id: &str) -> Result<Option<Cursor>, StoreError> {
        Ok(self.inner.lock().unwrap().cursors.get(indexer_id).cloned())
    }

    async fn save(&self, indexer_id: &str, cursor: &Cursor) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .cursors
            .insert(indexer_id.to_string(), cursor.clone());
        Ok(())
    }

    async fn delete(&self, indexer_id: &str) -> Result<(), StoreError> {
        self.inner.lock().unwrap().cursors.remove(indexer_id);
        Ok(())
    }
}
