//! `AggregateStore` trait — the durable store's merge-upsert capability.
//!
//! Implementations must make `apply` idempotent under replay: the store
//! records an applied-marker per `(event id, entity, key)` and re-applying
//! a marked upsert is a no-op. Durable backends live in
//! `agoraindex-storage`; the in-memory store here backs tests and
//! ephemeral runs.

use async_trait::async_trait;

use crate::entity::{AggregateRow, EntityKind, EntityUpsert};
use crate::error::StoreError;

/// What `apply` did with an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Merged into the row (created if absent).
    Applied,
    /// Already applied under this event id — replay, skipped.
    Duplicate,
}

/// Merge-upsert capability over the four aggregate entities.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Apply one idempotent merge-upsert.
    async fn apply(&self, upsert: &EntityUpsert) -> Result<ApplyOutcome, StoreError>;

    /// Fetch a row by natural key.
    async fn fetch(
        &self,
        entity: EntityKind,
        key: &str,
    ) -> Result<Option<AggregateRow>, StoreError>;
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct MemoryInner {
    rows: HashMap<(EntityKind, String), AggregateRow>,
    applied: HashSet<(String, EntityKind, String)>,
}

/// In-memory aggregate store for tests and ephemeral indexers.
#[derive(Default)]
pub struct MemoryAggregateStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryAggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialized rows across all entities.
    pub fn row_count(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }

    /// Keys of all rows of one entity, sorted.
    pub fn keys(&self, entity: EntityKind) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        let mut keys: Vec<_> = inner
            .rows
            .keys()
            .filter(|(e, _)| *e == entity)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl AggregateStore for MemoryAggregateStore {
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

#[cfg(test)]
mod tests {
    use super::*;
    use agoraindex_codec::{EventPosition, U256};

    fn deposit(block: u64, idx: u32, amount: u64) -> EntityUpsert {
        EntityUpsert::new(
            EntityKind::ContractState,
            "0xc",
            EventPosition::new(block, idx),
        )
        .add("total_deposited", U256::from_u64(amount))
    }

    #[tokio::test]
    async fn apply_twice_equals_apply_once() {
        let store = MemoryAggregateStore::new();
        let up = deposit(10, 0, 500);

        assert_eq!(store.apply(&up).await.unwrap(), ApplyOutcome::Applied);
        assert_eq!(store.apply(&up).await.unwrap(), ApplyOutcome::Duplicate);

        let row = store
            .fetch(EntityKind::ContractState, "0xc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.amount("total_deposited").to_decimal_string(), "500");
    }

    #[tokio::test]
    async fn distinct_events_accumulate() {
        let store = MemoryAggregateStore::new();
        store.apply(&deposit(10, 0, 500)).await.unwrap();
        store.apply(&deposit(10, 1, 300)).await.unwrap();

        let row = store
            .fetch(EntityKind::ContractState, "0xc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.amount("total_deposited").to_decimal_string(), "800");
    }

    #[tokio::test]
    async fn markers_are_scoped_to_entity_and_key() {
        let store = MemoryAggregateStore::new();
        let pos = EventPosition::new(10, 0);
        // one event touching two entities: both must land
        let a = EntityUpsert::new(EntityKind::ContractState, "0xc", pos)
            .add("total_deposited", U256::from_u64(5));
        let b = EntityUpsert::new(EntityKind::EpochState, "0xc:1", pos)
            .add("total_deposited", U256::from_u64(5));

        assert_eq!(store.apply(&a).await.unwrap(), ApplyOutcome::Applied);
        assert_eq!(store.apply(&b).await.unwrap(), ApplyOutcome::Applied);
        assert_eq!(store.row_count(), 2);
    }

    #[tokio::test]
    async fn fetch_missing_returns_none() {
        let store = MemoryAggregateStore::new();
        assert!(store
            .fetch(EntityKind::UserProfile, "0xnope")
            .await
            .unwrap()
            .is_none());
    }
}
