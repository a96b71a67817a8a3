//! Upsert engine — applies entity upserts against the durable store.
//!
//! Per-upsert idempotence lives in the store (`apply` + markers); this
//! layer sequences the writes for one event, keeps counts for logs, and
//! classifies failures: any store error aborts the batch so the cursor
//! never advances past an unlanded write.

use std::sync::Arc;

use tracing::{debug, error};

use crate::entity::EntityUpsert;
use crate::error::IndexerError;
use crate::store::{AggregateStore, ApplyOutcome};

/// Counts from applying one slice of upserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub applied: u64,
    pub duplicates: u64,
}

impl UpsertStats {
    pub fn absorb(&mut self, other: UpsertStats) {
        self.applied += other.applied;
        self.duplicates += other.duplicates;
    }
}

/// Applies upserts in order against one store.
pub struct UpsertEngine {
    store: Arc<dyn AggregateStore>,
}

impl UpsertEngine {
    pub fn new(store: Arc<dyn AggregateStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn AggregateStore> {
        &self.store
    }

    /// Apply every upsert, in order. The first store failure aborts — the
    /// caller retries the whole batch from the cursor, and markers make
    /// the replay converge.
    pub async fn apply_all(&self, upserts: &[EntityUpsert]) -> Result<UpsertStats, IndexerError> {
        let mut stats = UpsertStats::default();
        for upsert in upserts {
            if upsert.is_empty() {
                continue;
            }
            match self.store.apply(upsert).await {
                Ok(ApplyOutcome::Applied) => stats.applied += 1,
                Ok(ApplyOutcome::Duplicate) => {
                    stats.duplicates += 1;
                    debug!(
                        entity = %upsert.entity,
                        key = %upsert.key,
                        event = %upsert.event_id(),
                        "duplicate upsert absorbed"
                    );
                }
                Err(e) => {
                    error!(
                        entity = %upsert.entity,
                        key = %upsert.key,
                        transient = e.is_transient(),
                        error = %e,
                        "store write failed; aborting batch"
                    );
                    return Err(e.into());
                }
            }
        }
        Ok(stats)
    }
}
