//! Aggregate entities and the merge-upsert model.
//!
//! Every aggregate field is either a monotonic accumulation (`Add`) or a
//! last-write-wins snapshot (`Set`); nothing is ever recomputed from
//! history. An upsert names exactly the fields the event reports and
//! leaves every other field untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use agoraindex_codec::{EventPosition, U256};

/// The four derived aggregate entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Per-contract running totals; key = contract address.
    ContractState,
    /// Per-epoch totals; key = `contract:epoch`.
    EpochState,
    /// Cumulative per-user totals; key = user id.
    UserProfile,
    /// Per-user-per-epoch totals; key = `user:contract:epoch`.
    UserEpochState,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContractState => "contract_state",
            Self::EpochState => "epoch_state",
            Self::UserProfile => "user_profile",
            Self::UserEpochState => "user_epoch_state",
        }
    }

    pub fn all() -> [EntityKind; 4] {
        [
            Self::ContractState,
            Self::EpochState,
            Self::UserProfile,
            Self::UserEpochState,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoreValue {
    /// 256-bit amount, serialized as a decimal string.
    Amount(U256),
    Integer(i64),
    Text(String),
    Bool(bool),
    /// List-valued fields are replaced wholesale, never appended.
    TextList(Vec<String>),
}

/// How one field of an upsert merges into the stored row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum MergeOp {
    /// Accumulate into an `Amount` field (saturating).
    Add(U256),
    /// Overwrite, guarded by event position so a later event always wins
    /// regardless of arrival order.
    Set(StoreValue),
}

/// One idempotent merge-upsert against a single aggregate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityUpsert {
    pub entity: EntityKind,
    /// Natural key of the row.
    pub key: String,
    /// Fields to merge, in declaration order.
    pub ops: Vec<(String, MergeOp)>,
    /// Chain position of the originating event.
    pub position: EventPosition,
}

impl EntityUpsert {
    pub fn new(entity: EntityKind, key: impl Into<String>, position: EventPosition) -> Self {
        Self {
            entity,
            key: key.into(),
            ops: Vec::new(),
            position,
        }
    }

    /// Queue an additive merge.
    pub fn add(mut self, field: impl Into<String>, delta: U256) -> Self {
        self.ops.push((field.into(), MergeOp::Add(delta)));
        self
    }

    /// Queue a last-write-wins overwrite.
    pub fn set(mut self, field: impl Into<String>, value: StoreValue) -> Self {
        self.ops.push((field.into(), MergeOp::Set(value)));
        self
    }

    /// Stable id of the originating event — the dedupe marker key together
    /// with `(entity, key)`.
    pub fn event_id(&self) -> String {
        self.position.event_id()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A materialized aggregate row: named fields plus per-field versions for
/// the last-write-wins ops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub fields: BTreeMap<String, StoreValue>,
    /// Chain position that last set each `Set` field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub versions: BTreeMap<String, EventPosition>,
    /// Unix timestamp of the last write; maintained by the store.
    #[serde(default)]
    pub updated_at: i64,
}

impl AggregateRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&StoreValue> {
        self.fields.get(field)
    }

    pub fn amount(&self, field: &str) -> U256 {
        match self.fields.get(field) {
            Some(StoreValue::Amount(v)) => *v,
            _ => U256::ZERO,
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(StoreValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        match self.fields.get(field) {
            Some(StoreValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        match self.fields.get(field) {
            Some(StoreValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn text_list(&self, field: &str) -> Option<&[String]> {
        match self.fields.get(field) {
            Some(StoreValue::TextList(items)) => Some(items),
            _ => None,
        }
    }

    /// Merge an upsert into this row: insert-if-absent semantics per field,
    /// overwriting exactly the fields named and leaving the rest untouched.
    ///
    /// `Add` accumulates (the caller guarantees each event id is applied at
    /// most once); `Set` lands only when the upsert's position is
    /// at-or-after the field's recorded version.
    pub fn merge(&mut self, upsert: &EntityUpsert) {
        for (field, op) in &upsert.ops {
            match op {
                MergeOp::Add(delta) => {
                    let next = match self.fields.get(field) {
                        Some(StoreValue::Amount(cur)) => cur.saturating_add(delta),
                        Some(other) => {
                            warn!(
                                entity = %upsert.entity,
                                field = %field,
                                "additive merge over non-amount value {other:?}; resetting"
                            );
                            *delta
                        }
                        None => *delta,
                    };
                    self.fields.insert(field.clone(), StoreValue::Amount(next));
                }
                MergeOp::Set(value) => {
                    let stale = self
                        .versions
                        .get(field)
                        .is_some_and(|seen| upsert.position < *seen);
                    if !stale {
                        self.fields.insert(field.clone(), value.clone());
                        self.versions.insert(field.clone(), upsert.position);
                    }
                }
            }
        }
    }
}
