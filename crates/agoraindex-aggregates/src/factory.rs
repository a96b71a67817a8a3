//! Factory expansion — growing the watch set at runtime.
//!
//! The hub contract announces each newly created topic contract with a
//! `TopicCreated` event. This handler registers the new address (with the
//! full topic selector set) against the shared filter; the index loop
//! re-issues the subscription before requesting the next batch.
//! Registration is idempotent: re-delivered creation events are no-ops.

use agoraindex_codec::{event_selector, DecodedEvent, Felt};
use agoraindex_core::{
    BatchContext, EntityKind, EntityUpsert, EventHandler, HandlerError, SharedFilterSet,
    StoreValue,
};
use tracing::{debug, info};

use crate::events::TopicCreated;
use crate::model::{fields, keys};
use crate::selectors::{self, names};

/// Watches the hub for topic creation and feeds the filter set.
pub struct TopicCreatedHandler {
    filter: SharedFilterSet,
}

impl TopicCreatedHandler {
    pub fn new(filter: SharedFilterSet) -> Self {
        Self { filter }
    }
}

impl EventHandler for TopicCreatedHandler {
    fn name(&self) -> &str {
        "topic-created"
    }

    fn selectors(&self) -> Vec<Felt> {
        vec![event_selector(names::TOPIC_CREATED)]
    }

    fn handle(
        &self,
        event: &DecodedEvent,
        _ctx: &BatchContext,
    ) -> Result<Vec<EntityUpsert>, HandlerError> {
        let ev = TopicCreated::from_event(event)?;

        let newly_watched = self
            .filter
            .lock()
            .unwrap()
            .add(ev.topic, selectors::topic_selectors());
        if newly_watched {
            info!(topic = %ev.topic, name = %ev.name, "new topic announced; watching");
        } else {
            debug!(topic = %ev.topic, "topic already watched; creation replayed");
        }

        // Seed the topic's aggregate row so it exists before its first own
        // event arrives.
        Ok(vec![EntityUpsert::new(
            EntityKind::ContractState,
            keys::contract(&ev.topic),
            event.position(),
        )
        .set(fields::CREATOR, StoreValue::Text(ev.creator.to_string()))
        .set(fields::NAME, StoreValue::Text(ev.name))])
    }
}
