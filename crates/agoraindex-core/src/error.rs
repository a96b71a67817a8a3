//! Error types for the indexing pipeline.

use thiserror::Error;

/// Errors from a durable-store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity-class failure; the batch is retried from the cursor.
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("natural key rejected for {entity}/{key}: {reason}")]
    Conflict {
        entity: String,
        key: String,
        reason: String,
    },

    #[error("row serialization error: {0}")]
    Serialization(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` if retrying the batch can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Errors from an aggregation handler computing upserts.
///
/// Handler errors are isolated per handler: the dispatcher logs them and
/// continues with the remaining handlers and events.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("event '{event}' rejected: {reason}")]
    Rejected { event: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Top-level errors from the index loop.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("indexer aborted: {reason}")]
    Aborted { reason: String },

    #[error("{0}")]
    Other(String),
}
