//! Event dispatcher — routes decoded events to interested handlers.
//!
//! Independent indexer units register their selector sets against one
//! shared subscription; registrations may overlap. Handlers run in
//! registration order and are isolated from each other: one handler's
//! failure is logged and the rest still see the event.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use agoraindex_codec::{DecodedEvent, Felt};

use crate::entity::EntityUpsert;
use crate::error::HandlerError;
use crate::provider::BlockHeader;

/// Context shared by every handler invocation for one batch.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub header: BlockHeader,
    /// The owning indexer's id (for logs).
    pub indexer_id: String,
}

/// An aggregation handler: a pure computation from a decoded event to the
/// entity upserts it implies. Store writes belong to the upsert engine.
pub trait EventHandler: Send + Sync {
    /// Handler name, used in logs.
    fn name(&self) -> &str;

    /// The selectors this handler wants to see.
    fn selectors(&self) -> Vec<Felt>;

    fn handle(
        &self,
        event: &DecodedEvent,
        ctx: &BatchContext,
    ) -> Result<Vec<EntityUpsert>, HandlerError>;
}

/// Result of routing one event.
#[derive(Debug, Default)]
pub struct RouteOutcome {
    pub upserts: Vec<EntityUpsert>,
    /// Handlers that matched the selector.
    pub handlers_matched: usize,
    /// Handlers that failed; their upserts are dropped, the rest proceed.
    pub handler_errors: usize,
}

/// Selector → handler fan-out table, built once at startup.
#[derive(Default)]
pub struct Dispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
    by_selector: HashMap<Felt, Vec<usize>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for its selector set. Order of registration is
    /// the order handlers run in.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        let idx = self.handlers.len();
        for selector in handler.selectors() {
            self.by_selector.entry(selector).or_default().push(idx);
        }
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Invoke every handler whose selector set contains the event's
    /// selector, collecting the upserts they compute.
    pub fn route(&self, event: &DecodedEvent, ctx: &BatchContext) -> RouteOutcome {
        let mut outcome = RouteOutcome::default();
        let Some(indices) = self.by_selector.get(&event.selector) else {
            return outcome;
        };
        outcome.handlers_matched = indices.len();

        for &idx in indices {
            let handler = &self.handlers[idx];
            match handler.handle(event, ctx) {
                Ok(upserts) => outcome.upserts.extend(upserts),
                Err(e) => {
                    outcome.handler_errors += 1;
                    warn!(
                        handler = handler.name(),
                        event = %event.name,
                        block = event.block_number,
                        error = %e,
                        "handler failed; continuing with remaining handlers"
                    );
                }
            }
        }
        outcome
    }
}
