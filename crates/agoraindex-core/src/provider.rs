//! `BlockProvider` trait — abstraction over the upstream stream provider.
//!
//! The provider accepts a resumption cursor plus a filter and yields
//! batches of `(header, events[])`. Delivery is at-least-once: the
//! provider may replay blocks at-or-after the cursor, and adding an
//! address requires re-issuing the subscription.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use agoraindex_codec::RawEvent;

use crate::cursor::Cursor;
use crate::error::IndexerError;
use crate::filter::FilterSpec;

/// Header of one streamed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub block_number: u64,
    pub block_hash: String,
    /// Unix timestamp of the block (seconds since epoch).
    pub timestamp: i64,
}

/// One streamed batch: a block header and the filtered events within it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBatch {
    pub header: BlockHeader,
    pub events: Vec<RawEvent>,
}

/// A pinned stream of event batches from one subscription.
pub type BatchStream = Pin<Box<dyn Stream<Item = Result<EventBatch, IndexerError>> + Send>>;

/// Abstracts the upstream stream provider.
#[async_trait]
pub trait BlockProvider: Send + Sync {
    /// Open a subscription starting at-or-before `cursor` (from the start
    /// of history when `None`), restricted to `filter`.
    async fn subscribe(
        &self,
        cursor: Option<&Cursor>,
        filter: &FilterSpec,
    ) -> Result<BatchStream, IndexerError>;
}
