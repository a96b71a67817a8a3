//! Tip handler.
//!
//! Owns `total_tips` on `ContractState` and `UserProfile`. Tips are not
//! epoch-scoped, so no epoch rows are touched.

use agoraindex_codec::{event_selector, DecodedEvent, Felt};
use agoraindex_core::{BatchContext, EntityKind, EntityUpsert, EventHandler, HandlerError};

use crate::events::TipSent;
use crate::model::{fields, keys};
use crate::selectors::names;

/// Accumulates tips sent to a topic.
pub struct TipSentHandler;

impl EventHandler for TipSentHandler {
    fn name(&self) -> &str {
        "tip-sent"
    }

    fn selectors(&self) -> Vec<Felt> {
        vec![event_selector(names::TIP_SENT)]
    }

    fn handle(
        &self,
        event: &DecodedEvent,
        _ctx: &BatchContext,
    ) -> Result<Vec<EntityUpsert>, HandlerError> {
        let ev = TipSent::from_event(event)?;
        let pos = event.position();

        let mut ups = vec![EntityUpsert::new(
            EntityKind::ContractState,
            keys::contract(&event.address),
            pos,
        )
        .add(fields::TOTAL_TIPS, ev.amount)];

        if let Some(user) = ev.user {
            ups.push(
                EntityUpsert::new(EntityKind::UserProfile, keys::user(&user), pos)
                    .add(fields::TOTAL_TIPS, ev.amount),
            );
        }

        Ok(ups)
    }
}
