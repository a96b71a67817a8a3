//! Epoch lifecycle handler.
//!
//! Owns `current_epoch`/`epoch_start`/`epoch_end` on `ContractState` and
//! the window fields on `EpochState`.

use agoraindex_codec::{event_selector, DecodedEvent, Felt};
use agoraindex_core::{
    BatchContext, EntityKind, EntityUpsert, EventHandler, HandlerError, StoreValue,
};

use crate::events::EpochAdvanced;
use crate::model::{fields, keys};
use crate::selectors::names;

/// Tracks the topic's epoch pointer and creates the epoch row.
pub struct EpochAdvancedHandler;

impl EventHandler for EpochAdvancedHandler {
    fn name(&self) -> &str {
        "epoch-advanced"
    }

    fn selectors(&self) -> Vec<Felt> {
        vec![event_selector(names::EPOCH_ADVANCED)]
    }

    fn handle(
        &self,
        event: &DecodedEvent,
        _ctx: &BatchContext,
    ) -> Result<Vec<EntityUpsert>, HandlerError> {
        let ev = EpochAdvanced::from_event(event)?;
        let contract = event.address;
        let pos = event.position();

        Ok(vec![
            EntityUpsert::new(EntityKind::ContractState, keys::contract(&contract), pos)
                .set(fields::CURRENT_EPOCH, StoreValue::Integer(ev.epoch as i64))
                .set(fields::EPOCH_START, StoreValue::Integer(ev.start_time as i64))
                .set(fields::EPOCH_END, StoreValue::Integer(ev.end_time as i64)),
            EntityUpsert::new(EntityKind::EpochState, keys::epoch(&contract, ev.epoch), pos)
                .set(fields::CONTRACT, StoreValue::Text(contract.to_string()))
                .set(fields::EPOCH_INDEX, StoreValue::Integer(ev.epoch as i64))
                .set(fields::START_TIME, StoreValue::Integer(ev.start_time as i64))
                .set(fields::END_TIME, StoreValue::Integer(ev.end_time as i64)),
        ])
    }
}
