//! End-to-end pipeline scenarios: raw words in, aggregate rows out.
//!
//! Each test drives the real decode → dispatch → upsert path against the
//! in-memory store, the way the index loop does per batch.

use std::sync::Arc;

use agoraindex_aggregates::model::{
    keys, ContractStateView, EpochStateView, UserEpochStateView, UserProfileView,
};
use agoraindex_aggregates::selectors::{self, names};
use agoraindex_aggregates::{build_registry, register_all};
use agoraindex_codec::{bytearray, event_selector, Felt, RawEvent, SchemaRegistry, U256};
use agoraindex_core::{
    filter, AggregateStore, BatchContext, BlockHeader, Dispatcher, EntityKind,
    MemoryAggregateStore, SharedFilterSet, UpsertEngine,
};

const HUB: u64 = 0xFAC;
const TOPIC: u64 = 0xC0;
const USER: u64 = 0x55;

struct Pipeline {
    registry: SchemaRegistry,
    dispatcher: Dispatcher,
    engine: UpsertEngine,
    store: Arc<MemoryAggregateStore>,
    filter: SharedFilterSet,
}

impl Pipeline {
    fn new() -> Self {
        let filter = filter::shared(vec![(
            Felt::from_u64(HUB).to_address(),
            selectors::hub_selectors(),
        )]);
        filter.lock().unwrap().apply();

        let mut dispatcher = Dispatcher::new();
        register_all(&mut dispatcher, filter.clone());

        let store = Arc::new(MemoryAggregateStore::new());
        Self {
            registry: build_registry(),
            dispatcher,
            engine: UpsertEngine::new(store.clone()),
            store,
            filter,
        }
    }

    /// Decode, dispatch, and upsert a batch the way the index loop does.
    async fn run_batch(&self, events: &[RawEvent]) {
        let block = events.first().map(|e| e.block_number).unwrap_or(0);
        let ctx = BatchContext {
            header: BlockHeader {
                block_number: block,
                block_hash: format!("0x{block:x}"),
                timestamp: 1_700_000_000,
            },
            indexer_id: "pipeline-test".into(),
        };
        for raw in events {
            let Ok(decoded) = self.registry.decode(raw) else {
                continue; // unknown/truncated events are skipped, not fatal
            };
            let outcome = self.dispatcher.route(&decoded, &ctx);
            self.engine.apply_all(&outcome.upserts).await.unwrap();
        }
    }

    async fn contract(&self) -> ContractStateView {
        let key = keys::contract(&Felt::from_u64(TOPIC).to_address());
        let row = self
            .store
            .fetch(EntityKind::ContractState, &key)
            .await
            .unwrap()
            .unwrap_or_default();
        ContractStateView::from_row(&row)
    }

    async fn epoch(&self, epoch: u64) -> EpochStateView {
        let key = keys::epoch(&Felt::from_u64(TOPIC).to_address(), epoch);
        let row = self
            .store
            .fetch(EntityKind::EpochState, &key)
            .await
            .unwrap()
            .unwrap_or_default();
        EpochStateView::from_row(&row)
    }

    async fn user(&self) -> UserProfileView {
        let row = self
            .store
            .fetch(EntityKind::UserProfile, &keys::user(&Felt::from_u64(USER)))
            .await
            .unwrap()
            .unwrap_or_default();
        UserProfileView::from_row(&row)
    }

    async fn user_epoch(&self, epoch: u64) -> UserEpochStateView {
        let key = keys::user_epoch(
            &Felt::from_u64(USER),
            &Felt::from_u64(TOPIC).to_address(),
            epoch,
        );
        let row = self
            .store
            .fetch(EntityKind::UserEpochState, &key)
            .await
            .unwrap()
            .unwrap_or_default();
        UserEpochStateView::from_row(&row)
    }
}

// ─── Raw event builders ──────────────────────────────────────────────────────

fn raw(address: u64, block: u64, idx: u32, keys: Vec<Felt>, data: Vec<Felt>) -> RawEvent {
    RawEvent {
        block_number: block,
        block_hash: format!("0x{block:x}"),
        block_timestamp: 1_700_000_000 + block as i64,
        address: Felt::from_u64(address),
        keys,
        data,
        event_index: idx,
    }
}

fn u256_words(v: u64) -> [Felt; 2] {
    [Felt::from_u64(v), Felt::ZERO]
}

fn epoch_advanced(block: u64, idx: u32, epoch: u64, start: u64, end: u64) -> RawEvent {
    raw(
        TOPIC,
        block,
        idx,
        vec![event_selector(names::EPOCH_ADVANCED), Felt::from_u64(epoch)],
        vec![Felt::from_u64(start), Felt::from_u64(end)],
    )
}

fn deposit(block: u64, idx: u32, epoch: u64, user: u64, amount: u64) -> RawEvent {
    let [low, high] = u256_words(amount);
    raw(
        TOPIC,
        block,
        idx,
        vec![
            event_selector(names::REWARDS_DEPOSITED),
            Felt::from_u64(epoch),
            Felt::from_u64(0xDE),
        ],
        vec![Felt::from_u64(user), low, high],
    )
}

fn distribute(block: u64, idx: u32, epoch: u64, user: u64, algo: u64, vote: u64) -> RawEvent {
    let [al, ah] = u256_words(algo);
    let [vl, vh] = u256_words(vote);
    raw(
        TOPIC,
        block,
        idx,
        vec![
            event_selector(names::REWARDS_DISTRIBUTED),
            Felt::from_u64(epoch),
            Felt::from_u64(0xEE),
        ],
        vec![Felt::from_u64(user), al, ah, vl, vh],
    )
}

fn score(block: u64, idx: u32, epoch: u64, user: u64, value: u64) -> RawEvent {
    let [low, high] = u256_words(value);
    raw(
        TOPIC,
        block,
        idx,
        vec![event_selector(names::SCORE_PUSHED), Felt::from_u64(user)],
        vec![Felt::from_u64(epoch), low, high],
    )
}

fn topic_created(block: u64, idx: u32, topic: u64, name: &str) -> RawEvent {
    let mut data = vec![Felt::from_u64(0xC1)];
    data.extend(bytearray::encode(name));
    raw(
        HUB,
        block,
        idx,
        vec![event_selector(names::TOPIC_CREATED), Felt::from_u64(topic)],
        data,
    )
}

fn tip(block: u64, idx: u32, user: u64, amount: u64) -> RawEvent {
    let [low, high] = u256_words(amount);
    raw(
        TOPIC,
        block,
        idx,
        vec![event_selector(names::TIP_SENT), Felt::from_u64(0xF0)],
        vec![Felt::from_u64(user), low, high],
    )
}

fn topic_metadata(block: u64, idx: u32, name: &str, kw: &[&str]) -> RawEvent {
    let mut data = bytearray::encode(name);
    data.push(Felt::from_u64(kw.len() as u64));
    for k in kw {
        data.push(Felt::from_short_string(k).unwrap());
    }
    raw(
        TOPIC,
        block,
        idx,
        vec![event_selector(names::TOPIC_METADATA_ADDED)],
        data,
    )
}

fn address_linked(block: u64, idx: u32, user: u64, admin: bool) -> RawEvent {
    let mut data = vec![Felt::from_u64(0xCAFE)];
    if admin {
        data.push(Felt::from_u64(1));
        data.push(Felt::from_u64(0xAD));
    } else {
        data.push(Felt::ZERO);
    }
    raw(
        0xAB,
        block,
        idx,
        vec![event_selector(names::ADDRESS_LINKED), Felt::from_u64(user)],
        data,
    )
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn deposits_sum_into_epoch_and_contract_totals() {
    let p = Pipeline::new();
    p.run_batch(&[
        epoch_advanced(100, 0, 1, 1_000, 2_000),
        deposit(100, 1, 1, 0, 500),
        deposit(100, 2, 1, 0, 300),
    ])
    .await;

    let epoch = p.epoch(1).await;
    assert_eq!(epoch.total_deposited.to_decimal_string(), "800");
    assert_eq!(epoch.start_time, Some(1_000));
    assert_eq!(epoch.end_time, Some(2_000));

    let contract = p.contract().await;
    assert_eq!(contract.total_deposited.to_decimal_string(), "800");
    assert_eq!(contract.current_epoch, Some(1));
}

#[tokio::test]
async fn epoch_row_is_unique_across_interleavings() {
    // deposit arrives before the epoch-advance that names the same epoch
    let p = Pipeline::new();
    p.run_batch(&[
        deposit(100, 0, 1, 0, 500),
        epoch_advanced(100, 1, 1, 1_000, 2_000),
        deposit(100, 2, 1, 0, 300),
    ])
    .await;

    assert_eq!(p.store.keys(EntityKind::EpochState).len(), 1);
    let epoch = p.epoch(1).await;
    assert_eq!(epoch.total_deposited.to_decimal_string(), "800");
    assert_eq!(epoch.start_time, Some(1_000));
    assert_eq!(epoch.epoch_index, Some(1));
}

#[tokio::test]
async fn replaying_a_whole_batch_converges() {
    let batch = vec![
        epoch_advanced(100, 0, 1, 1_000, 2_000),
        deposit(100, 1, 1, USER, 500),
        distribute(100, 2, 1, USER, 70, 30),
        score(100, 3, 1, USER, 87),
    ];

    let p = Pipeline::new();
    p.run_batch(&batch).await;
    let key = keys::epoch(&Felt::from_u64(TOPIC).to_address(), 1);
    let first_pass = p
        .store
        .fetch(EntityKind::EpochState, &key)
        .await
        .unwrap()
        .unwrap()
        .fields;

    // reconnect-with-duplicates: the provider replays the whole batch
    p.run_batch(&batch).await;
    p.run_batch(&batch).await;

    let replayed = p
        .store
        .fetch(EntityKind::EpochState, &key)
        .await
        .unwrap()
        .unwrap()
        .fields;
    assert_eq!(first_pass, replayed);

    let user = p.user().await;
    assert_eq!(user.total_deposited.to_decimal_string(), "500");
    assert_eq!(user.total_claimed.to_decimal_string(), "100");
}

#[tokio::test]
async fn partial_failure_then_full_replay_matches_clean_run() {
    let batch = vec![
        deposit(100, 0, 1, USER, 500),
        distribute(100, 1, 1, USER, 70, 30),
    ];

    // crashed run: only the first event's upserts landed before the store
    // went away
    let partial = Pipeline::new();
    partial.run_batch(&batch[..1]).await;
    // retry applies the batch whole, duplicates included
    partial.run_batch(&batch).await;

    // clean run for comparison
    let clean = Pipeline::new();
    clean.run_batch(&batch).await;

    for entity in EntityKind::all() {
        for key in clean.store.keys(entity) {
            let a = partial
                .store
                .fetch(entity, &key)
                .await
                .unwrap()
                .unwrap()
                .fields;
            let b = clean.store.fetch(entity, &key).await.unwrap().unwrap().fields;
            assert_eq!(a, b, "{entity}/{key} diverged");
        }
    }
}

#[tokio::test]
async fn later_score_wins_regardless_of_arrival_order() {
    let p = Pipeline::new();
    // block 12 arrives before block 11 within the same batch
    p.run_batch(&[score(12, 0, 1, USER, 90), score(11, 0, 1, USER, 40)])
        .await;

    assert_eq!(p.contract().await.latest_score.to_decimal_string(), "90");
    assert_eq!(p.epoch(1).await.latest_score.to_decimal_string(), "90");
    assert_eq!(p.user().await.latest_score.to_decimal_string(), "90");
    assert_eq!(p.user_epoch(1).await.latest_score.to_decimal_string(), "90");
}

#[tokio::test]
async fn unknown_selector_is_skipped_and_the_rest_applies() {
    let p = Pipeline::new();
    let foreign = raw(TOPIC, 100, 0, vec![Felt::from_u64(0xDEAD)], vec![]);
    p.run_batch(&[foreign, deposit(100, 1, 1, 0, 75)]).await;

    assert_eq!(p.contract().await.total_deposited.to_decimal_string(), "75");
}

#[tokio::test]
async fn factory_event_grows_the_filter_exactly_once() {
    let p = Pipeline::new();
    let creation = topic_created(100, 0, 0xABC, "Generative Art");
    p.run_batch(std::slice::from_ref(&creation)).await;

    {
        let f = p.filter.lock().unwrap();
        assert!(f.should_reapply());
        assert!(f.contains(&Felt::from_u64(0xABC).to_address()));
        assert_eq!(f.len(), 2); // hub + new topic
    }
    p.filter.lock().unwrap().apply();

    // duplicate creation event: no new entry, no reapply request
    p.run_batch(&[creation]).await;
    let f = p.filter.lock().unwrap();
    assert_eq!(f.len(), 2);
    assert!(!f.should_reapply());
}

#[tokio::test]
async fn factory_event_seeds_the_topic_row() {
    let p = Pipeline::new();
    p.run_batch(&[topic_created(100, 0, 0xABC, "Generative Art")])
        .await;

    let key = keys::contract(&Felt::from_u64(0xABC).to_address());
    let row = p
        .store
        .fetch(EntityKind::ContractState, &key)
        .await
        .unwrap()
        .unwrap();
    let view = ContractStateView::from_row(&row);
    assert_eq!(view.name.as_deref(), Some("Generative Art"));
    assert_eq!(
        view.creator.as_deref(),
        Some(Felt::from_u64(0xC1).to_address().to_string().as_str())
    );
}

#[tokio::test]
async fn distribution_breakdown_mirrors_into_user_epoch() {
    let p = Pipeline::new();
    p.run_batch(&[distribute(100, 0, 2, USER, 70, 30)]).await;

    let epoch = p.epoch(2).await;
    assert_eq!(epoch.total_claimed.to_decimal_string(), "100");
    assert_eq!(epoch.claimed_algo.to_decimal_string(), "70");
    assert_eq!(epoch.claimed_vote.to_decimal_string(), "30");

    let ue = p.user_epoch(2).await;
    assert_eq!(ue.total_claimed.to_decimal_string(), "100");
    assert_eq!(ue.claimed_algo.to_decimal_string(), "70");
    assert_eq!(ue.claimed_vote.to_decimal_string(), "30");
}

#[tokio::test]
async fn tips_accumulate_on_contract_and_user() {
    let p = Pipeline::new();
    p.run_batch(&[tip(100, 0, USER, 25), tip(100, 1, 0, 10)]).await;

    assert_eq!(p.contract().await.total_tips.to_decimal_string(), "35");
    // the anonymous tip stays off the user row
    assert_eq!(p.user().await.total_tips.to_decimal_string(), "25");
}

#[tokio::test]
async fn metadata_lists_replace_instead_of_append() {
    let p = Pipeline::new();
    p.run_batch(&[topic_metadata(100, 0, "Art", &["art", "ai"])]).await;
    p.run_batch(&[topic_metadata(101, 0, "Art", &["defi"])]).await;

    let contract = p.contract().await;
    assert_eq!(contract.keywords, vec!["defi".to_string()]);
}

#[tokio::test]
async fn admin_link_sets_the_provenance_flag() {
    let p = Pipeline::new();
    p.run_batch(&[address_linked(100, 0, USER, false)]).await;
    assert!(!p.user().await.linked_by_admin);

    p.run_batch(&[address_linked(101, 0, USER, true)]).await;
    let user = p.user().await;
    assert!(user.linked_by_admin);
    assert_eq!(
        user.linked_address.as_deref(),
        Some(Felt::from_u64(0xCAFE).to_address().to_string().as_str())
    );
}

#[tokio::test]
async fn u256_amounts_survive_the_whole_pipeline() {
    let p = Pipeline::new();
    // amount = 5 + 2·2^128, too large for any native integer
    let ev = raw(
        TOPIC,
        100,
        0,
        vec![
            event_selector(names::REWARDS_DEPOSITED),
            Felt::from_u64(1),
            Felt::from_u64(0xDE),
        ],
        vec![Felt::ZERO, Felt::from_u64(5), Felt::from_u64(2)],
    );
    p.run_batch(&[ev]).await;

    let expected = U256 { low: 5, high: 2 }.to_decimal_string();
    assert_eq!(
        p.contract().await.total_deposited.to_decimal_string(),
        expected
    );
}
