//! agoraindex-codec — word codec and event schema registry.
//!
//! # Architecture
//!
//! ```text
//! RawEvent (key/data words)
//!     │
//!     ├── Felt / U256 / ByteArray   (scalar word views)
//!     └── SchemaRegistry.decode     (selector → EventShape)
//!             │
//!             ▼
//!       DecodedEvent (named, typed fields)
//! ```

pub mod bytearray;
pub mod error;
pub mod event;
pub mod felt;
pub mod registry;
pub mod schema;
pub mod selector;
pub mod uint;

pub use error::{DecodeError, FeltError, RegistryError};
pub use event::{DecodedEvent, EventPosition, FieldValue, RawEvent};
pub use felt::{Address, Felt};
pub use registry::SchemaRegistry;
pub use schema::{EventShape, FieldDef, FieldKind, VariantDef};
pub use selector::event_selector;
pub use uint::U256;
