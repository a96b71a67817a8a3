//! Raw and decoded event types.

use serde::{Deserialize, Serialize};

use crate::felt::{Address, Felt};
use crate::uint::U256;

/// Where an event sits in the chain — block height plus position within
/// the block. Orders events by chain position, not arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventPosition {
    pub block_number: u64,
    pub event_index: u32,
}

impl EventPosition {
    pub fn new(block_number: u64, event_index: u32) -> Self {
        Self { block_number, event_index }
    }

    /// Stable per-event identifier, used for replay dedupe.
    pub fn event_id(&self) -> String {
        format!("{}:{}", self.block_number, self.event_index)
    }
}

/// A raw, undecoded event as delivered by the stream provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// Block height.
    pub block_number: u64,
    /// Block hash (`0x…`).
    pub block_hash: String,
    /// Block timestamp (Unix seconds, UTC).
    pub block_timestamp: i64,
    /// Contract address that emitted the event.
    pub address: Felt,
    /// Key words; `keys[0]` is the event selector.
    pub keys: Vec<Felt>,
    /// Data words.
    pub data: Vec<Felt>,
    /// Position of this event within its block.
    pub event_index: u32,
}

impl RawEvent {
    /// The selector key, if present.
    pub fn selector(&self) -> Option<&Felt> {
        self.keys.first()
    }

    pub fn position(&self) -> EventPosition {
        EventPosition::new(self.block_number, self.event_index)
    }

    /// Stable per-event identifier (`"{block}:{index}"`).
    pub fn event_id(&self) -> String {
        self.position().event_id()
    }
}

/// A decoded, named field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Felt(Felt),
    Address(Address),
    Uint(u64),
    Uint256(U256),
    Bool(bool),
    Text(String),
    List(Vec<FieldValue>),
    Variant {
        name: String,
        fields: Vec<(String, FieldValue)>,
    },
}

impl FieldValue {
    pub fn as_felt(&self) -> Option<&Felt> {
        match self {
            FieldValue::Felt(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            FieldValue::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u256(&self) -> Option<&U256> {
        match self {
            FieldValue::Uint256(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A fully decoded event — selector-tagged, with named typed fields in
/// shape order. Produced once per `RawEvent`, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedEvent {
    /// Matched shape name, e.g. `"RewardsDeposited"`.
    pub name: String,
    /// The selector that matched.
    pub selector: Felt,
    /// Emitting contract address (normalized).
    pub address: Address,
    pub block_number: u64,
    pub block_hash: String,
    pub block_timestamp: i64,
    pub event_index: u32,
    /// Decoded fields in declaration order.
    pub fields: Vec<(String, FieldValue)>,
}

impl DecodedEvent {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn position(&self) -> EventPosition {
        EventPosition::new(self.block_number, self.event_index)
    }

    pub fn event_id(&self) -> String {
        self.position().event_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_orders_by_block_then_index() {
        let a = EventPosition::new(100, 5);
        let b = EventPosition::new(100, 6);
        let c = EventPosition::new(101, 0);
        assert!(a < b && b < c);
    }

    #[test]
    fn event_id_is_stable() {
        let raw = RawEvent {
            block_number: 42,
            block_hash: "0xabc".into(),
            block_timestamp: 1_700_000_000,
            address: Felt::from_u64(7),
            keys: vec![Felt::from_u64(1)],
            data: vec![],
            event_index: 3,
        };
        assert_eq!(raw.event_id(), "42:3");
    }

    #[test]
    fn field_lookup() {
        let ev = DecodedEvent {
            name: "Test".into(),
            selector: Felt::from_u64(1),
            address: Felt::from_u64(9).to_address(),
            block_number: 1,
            block_hash: "0x1".into(),
            block_timestamp: 0,
            event_index: 0,
            fields: vec![("amount".into(), FieldValue::Uint256(U256::from_u64(5)))],
        };
        assert_eq!(ev.field("amount").unwrap().as_u256().unwrap(), &U256::from_u64(5));
        assert!(ev.field("missing").is_none());
    }
}
