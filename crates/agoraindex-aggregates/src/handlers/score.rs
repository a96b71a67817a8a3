//! Score handler.
//!
//! Owns `latest_score` on all four entities. A re-score supersedes the
//! prior value, so every write is a last-write-wins `Set` ordered by chain
//! position.

use agoraindex_codec::{event_selector, DecodedEvent, Felt};
use agoraindex_core::{
    BatchContext, EntityKind, EntityUpsert, EventHandler, HandlerError, StoreValue,
};

use crate::events::ScorePushed;
use crate::model::{fields, keys};
use crate::selectors::names;

/// Records the newest AI-derived score wherever it is surfaced.
pub struct ScorePushedHandler;

impl EventHandler for ScorePushedHandler {
    fn name(&self) -> &str {
        "score-pushed"
    }

    fn selectors(&self) -> Vec<Felt> {
        vec![event_selector(names::SCORE_PUSHED)]
    }

    fn handle(
        &self,
        event: &DecodedEvent,
        _ctx: &BatchContext,
    ) -> Result<Vec<EntityUpsert>, HandlerError> {
        let ev = ScorePushed::from_event(event)?;
        let contract = event.address;
        let pos = event.position();
        let score = StoreValue::Amount(ev.score);

        Ok(vec![
            EntityUpsert::new(EntityKind::ContractState, keys::contract(&contract), pos)
                .set(fields::LATEST_SCORE, score.clone()),
            EntityUpsert::new(EntityKind::EpochState, keys::epoch(&contract, ev.epoch), pos)
                .set(fields::CONTRACT, StoreValue::Text(contract.to_string()))
                .set(fields::EPOCH_INDEX, StoreValue::Integer(ev.epoch as i64))
                .set(fields::LATEST_SCORE, score.clone()),
            EntityUpsert::new(EntityKind::UserProfile, keys::user(&ev.user), pos)
                .set(fields::LATEST_SCORE, score.clone()),
            EntityUpsert::new(
                EntityKind::UserEpochState,
                keys::user_epoch(&ev.user, &contract, ev.epoch),
                pos,
            )
            .set(fields::USER_ID, StoreValue::Text(ev.user.to_fixed_hex()))
            .set(fields::CONTRACT, StoreValue::Text(contract.to_string()))
            .set(fields::EPOCH_INDEX, StoreValue::Integer(ev.epoch as i64))
            .set(fields::LATEST_SCORE, score),
        ])
    }
}
