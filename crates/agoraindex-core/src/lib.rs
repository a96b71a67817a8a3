//! agoraindex-core — foundation for the event-aggregation indexing engine.
//!
//! # Architecture
//!
//! ```text
//! IndexEngine (one sequential consumer per subscription)
//!     ├── CursorManager   (persisted resumption position)
//!     ├── FilterSet       (additive address/selector watch set)
//!     ├── SchemaRegistry  (agoraindex-codec: selector → shape decode)
//!     ├── Dispatcher      (selector → handler fan-out, isolated failures)
//!     ├── UpsertEngine    (idempotent merge-upserts, batch-fatal on store errors)
//!     └── AggregateStore  (memory / SQLite backends)
//! ```

pub mod config;
pub mod consumer;
pub mod cursor;
pub mod dispatcher;
pub mod engine;
pub mod entity;
pub mod error;
pub mod filter;
pub mod provider;
pub mod store;

pub use config::{IndexerBuilder, IndexerConfig};
pub use consumer::{BatchStats, EngineState, IndexEngine, ShutdownHandle};
pub use cursor::{Cursor, CursorManager, CursorStore, MemoryCursorStore};
pub use dispatcher::{BatchContext, Dispatcher, EventHandler, RouteOutcome};
pub use engine::{UpsertEngine, UpsertStats};
pub use entity::{AggregateRow, EntityKind, EntityUpsert, MergeOp, StoreValue};
pub use error::{HandlerError, IndexerError, StoreError};
pub use filter::{AddressFilter, FilterSet, FilterSpec, SharedFilterSet};
pub use provider::{BatchStream, BlockHeader, BlockProvider, EventBatch};
pub use store::{AggregateStore, ApplyOutcome, MemoryAggregateStore};
