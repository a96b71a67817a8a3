//! Reward flow handlers.
//!
//! `RewardsDepositedHandler` owns `total_deposited`;
//! `RewardsDistributedHandler` owns `total_claimed` and the
//! `claimed_algo`/`claimed_vote` breakdown. Events without an attached
//! user identity update only the contract- and epoch-level aggregates.

use agoraindex_codec::{event_selector, DecodedEvent, Felt};
use agoraindex_core::{
    BatchContext, EntityKind, EntityUpsert, EventHandler, HandlerError, StoreValue,
};

use crate::events::{RewardsDeposited, RewardsDistributed};
use crate::model::{fields, keys};
use crate::selectors::names;

/// Marks an implicitly created epoch row with its identifying fields.
fn describe_epoch(up: EntityUpsert, contract: &agoraindex_codec::Address, epoch: u64) -> EntityUpsert {
    up.set(fields::CONTRACT, StoreValue::Text(contract.to_string()))
        .set(fields::EPOCH_INDEX, StoreValue::Integer(epoch as i64))
}

fn describe_user_epoch(
    up: EntityUpsert,
    user: &Felt,
    contract: &agoraindex_codec::Address,
    epoch: u64,
) -> EntityUpsert {
    up.set(fields::USER_ID, StoreValue::Text(user.to_fixed_hex()))
        .set(fields::CONTRACT, StoreValue::Text(contract.to_string()))
        .set(fields::EPOCH_INDEX, StoreValue::Integer(epoch as i64))
}

/// Accumulates deposits into the epoch pool.
pub struct RewardsDepositedHandler;

impl EventHandler for RewardsDepositedHandler {
    fn name(&self) -> &str {
        "rewards-deposited"
    }

    fn selectors(&self) -> Vec<Felt> {
        vec![event_selector(names::REWARDS_DEPOSITED)]
    }

    fn handle(
        &self,
        event: &DecodedEvent,
        _ctx: &BatchContext,
    ) -> Result<Vec<EntityUpsert>, HandlerError> {
        let ev = RewardsDeposited::from_event(event)?;
        let contract = event.address;
        let pos = event.position();

        let mut ups = vec![
            EntityUpsert::new(EntityKind::ContractState, keys::contract(&contract), pos)
                .add(fields::TOTAL_DEPOSITED, ev.amount),
            describe_epoch(
                EntityUpsert::new(EntityKind::EpochState, keys::epoch(&contract, ev.epoch), pos)
                    .add(fields::TOTAL_DEPOSITED, ev.amount),
                &contract,
                ev.epoch,
            ),
        ];

        if let Some(user) = ev.user {
            ups.push(
                EntityUpsert::new(EntityKind::UserProfile, keys::user(&user), pos)
                    .add(fields::TOTAL_DEPOSITED, ev.amount),
            );
            ups.push(describe_user_epoch(
                EntityUpsert::new(
                    EntityKind::UserEpochState,
                    keys::user_epoch(&user, &contract, ev.epoch),
                    pos,
                )
                .add(fields::TOTAL_DEPOSITED, ev.amount),
                &user,
                &contract,
                ev.epoch,
            ));
        }

        Ok(ups)
    }
}

/// Accumulates payouts and their algo/vote breakdown.
pub struct RewardsDistributedHandler;

impl EventHandler for RewardsDistributedHandler {
    fn name(&self) -> &str {
        "rewards-distributed"
    }

    fn selectors(&self) -> Vec<Felt> {
        vec![event_selector(names::REWARDS_DISTRIBUTED)]
    }

    fn handle(
        &self,
        event: &DecodedEvent,
        _ctx: &BatchContext,
    ) -> Result<Vec<EntityUpsert>, HandlerError> {
        let ev = RewardsDistributed::from_event(event)?;
        let contract = event.address;
        let pos = event.position();
        let total = ev.total();

        let mut ups = vec![
            EntityUpsert::new(EntityKind::ContractState, keys::contract(&contract), pos)
                .add(fields::TOTAL_CLAIMED, total),
            describe_epoch(
                EntityUpsert::new(EntityKind::EpochState, keys::epoch(&contract, ev.epoch), pos)
                    .add(fields::TOTAL_CLAIMED, total)
                    .add(fields::CLAIMED_ALGO, ev.amount_algo)
                    .add(fields::CLAIMED_VOTE, ev.amount_vote),
                &contract,
                ev.epoch,
            ),
        ];

        if let Some(user) = ev.user {
            ups.push(
                EntityUpsert::new(EntityKind::UserProfile, keys::user(&user), pos)
                    .add(fields::TOTAL_CLAIMED, total),
            );
            ups.push(describe_user_epoch(
                EntityUpsert::new(
                    EntityKind::UserEpochState,
                    keys::user_epoch(&user, &contract, ev.epoch),
                    pos,
                )
                .add(fields::TOTAL_CLAIMED, total)
                .add(fields::CLAIMED_ALGO, ev.amount_algo)
                .add(fields::CLAIMED_VOTE, ev.amount_vote),
                &user,
                &contract,
                ev.epoch,
            ));
        }

        Ok(ups)
    }
}
