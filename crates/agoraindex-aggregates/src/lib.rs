//! agoraindex-aggregates — platform event kinds and aggregation handlers.
//!
//! # Architecture
//!
//! ```text
//! DecodedEvent ──→ typed event kind (events.rs, closed set)
//!                      │
//!                      ▼
//!              handlers/* (one per kind)
//!                      │ EntityUpsert deltas
//!                      ▼
//!   ContractState · EpochState · UserProfile · UserEpochState
//!
//! factory.rs: TopicCreated ──→ FilterSet growth (next subscription cycle)
//! ```

pub mod events;
pub mod factory;
pub mod handlers;
pub mod model;
pub mod schemas;
pub mod selectors;

pub use events::PlatformEvent;
pub use factory::TopicCreatedHandler;
pub use handlers::register_all;
pub use schemas::build_registry;
