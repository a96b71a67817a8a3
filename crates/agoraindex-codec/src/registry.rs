//! Selector-keyed schema registry and the word-level decoder.
//!
//! The registry is built once at startup from the shapes the indexer cares
//! about and passed by reference into the dispatch path — no global state.
//! `decode` turns a `RawEvent` into a `DecodedEvent` or reports a
//! per-event error the caller treats as "skip and log".

use std::collections::HashMap;

use tracing::debug;

use crate::bytearray;
use crate::error::{DecodeError, RegistryError};
use crate::event::{DecodedEvent, FieldValue, RawEvent};
use crate::felt::Felt;
use crate::schema::{EventShape, FieldDef, FieldKind};
use crate::uint::U256;

/// Upper bound on count-prefixed array lengths; larger counts are corrupt.
const MAX_ARRAY_LEN: u64 = 1_024;

/// Tracks consumption of a word list so shape mismatches are detected
/// instead of misreading subsequent fields.
struct WordReader<'a> {
    words: &'a [Felt],
    pos: usize,
}

impl<'a> WordReader<'a> {
    fn new(words: &'a [Felt]) -> Self {
        Self { words, pos: 0 }
    }

    fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.words.len());
    }

    fn remaining(&self) -> usize {
        self.words.len() - self.pos
    }

    fn rest(&self) -> &'a [Felt] {
        &self.words[self.pos..]
    }

    fn next(&mut self) -> Option<&'a Felt> {
        let w = self.words.get(self.pos)?;
        self.pos += 1;
        Some(w)
    }
}

/// Immutable selector → shape table.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    shapes: HashMap<Felt, EventShape>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shape under its selector.
    pub fn register(&mut self, shape: EventShape) -> Result<(), RegistryError> {
        if let Some(existing) = self.shapes.get(&shape.selector) {
            return Err(RegistryError::AlreadyRegistered {
                name: existing.name.clone(),
                selector: shape.selector.to_hex(),
            });
        }
        self.shapes.insert(shape.selector, shape);
        Ok(())
    }

    /// Look up the shape registered for a selector.
    pub fn get(&self, selector: &Felt) -> Option<&EventShape> {
        self.shapes.get(selector)
    }

    /// Selectors of every registered shape.
    pub fn selectors(&self) -> Vec<Felt> {
        self.shapes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Decode a raw event against the registered shapes.
    ///
    /// Fails with `UnknownSelector` when no shape matches and
    /// `TruncatedEvent` when the words run out mid-shape; both are
    /// per-event errors, never batch-fatal.
    pub fn decode(&self, raw: &RawEvent) -> Result<DecodedEvent, DecodeError> {
        let selector = raw.selector().ok_or(DecodeError::MissingSelector)?;
        let shape = self
            .shapes
            .get(selector)
            .ok_or_else(|| DecodeError::UnknownSelector {
                selector: selector.to_hex(),
            })?;

        let mut fields = Vec::with_capacity(shape.keys.len() + shape.data.len());

        let mut keys = WordReader::new(&raw.keys);
        keys.skip(1); // keys[0] is the selector itself
        for def in &shape.keys {
            fields.push((def.name.clone(), decode_field(&mut keys, def, &shape.name)?));
        }

        let mut data = WordReader::new(&raw.data);
        for def in &shape.data {
            fields.push((def.name.clone(), decode_field(&mut data, def, &shape.name)?));
        }
        if data.remaining() > 0 {
            // Tolerated for forward compatibility with appended fields.
            debug!(
                event = %shape.name,
                extra = data.remaining(),
                "event carries trailing data words beyond its shape"
            );
        }

        Ok(DecodedEvent {
            name: shape.name.clone(),
            selector: *selector,
            address: raw.address.to_address(),
            block_number: raw.block_number,
            block_hash: raw.block_hash.clone(),
            block_timestamp: raw.block_timestamp,
            event_index: raw.event_index,
            fields,
        })
    }
}

fn truncated(event: &str, field: &str, needed: usize, available: usize) -> DecodeError {
    DecodeError::TruncatedEvent {
        event: event.to_string(),
        field: field.to_string(),
        needed,
        available,
    }
}

fn decode_field(
    reader: &mut WordReader<'_>,
    def: &FieldDef,
    event: &str,
) -> Result<FieldValue, DecodeError> {
    decode_kind(reader, &def.kind, &def.name, event)
}

fn decode_kind(
    reader: &mut WordReader<'_>,
    kind: &FieldKind,
    field: &str,
    event: &str,
) -> Result<FieldValue, DecodeError> {
    let invalid = |reason: String| DecodeError::InvalidField {
        event: event.to_string(),
        field: field.to_string(),
        reason,
    };

    match kind {
        FieldKind::Felt => {
            let w = reader.next().ok_or_else(|| truncated(event, field, 1, 0))?;
            Ok(FieldValue::Felt(*w))
        }
        FieldKind::Address => {
            let w = reader.next().ok_or_else(|| truncated(event, field, 1, 0))?;
            Ok(FieldValue::Address(w.to_address()))
        }
        FieldKind::Uint64 => {
            let w = reader.next().ok_or_else(|| truncated(event, field, 1, 0))?;
            let v = w.to_u64().map_err(|e| invalid(e.to_string()))?;
            Ok(FieldValue::Uint(v))
        }
        FieldKind::Uint256 => {
            let available = reader.remaining();
            if available < 2 {
                return Err(truncated(event, field, 2 - available, available));
            }
            let low = reader.next().ok_or_else(|| truncated(event, field, 2, 0))?;
            let high = reader.next().ok_or_else(|| truncated(event, field, 1, 1))?;
            Ok(FieldValue::Uint256(U256::from_words(low, high)))
        }
        FieldKind::Bool => {
            let w = reader.next().ok_or_else(|| truncated(event, field, 1, 0))?;
            match w.to_u64() {
                Ok(0) => Ok(FieldValue::Bool(false)),
                Ok(1) => Ok(FieldValue::Bool(true)),
                _ => Err(invalid("bool word must be 0 or 1".into())),
            }
        }
        FieldKind::ShortString => {
            let w = reader.next().ok_or_else(|| truncated(event, field, 1, 0))?;
            let s = w.to_short_string().map_err(|e| invalid(e.to_string()))?;
            Ok(FieldValue::Text(s))
        }
        FieldKind::ByteArray => {
            let (text, consumed) = bytearray::decode(reader.rest(), event)?;
            reader.skip(consumed);
            Ok(FieldValue::Text(text))
        }
        FieldKind::Array(elem) => {
            let w = reader.next().ok_or_else(|| truncated(event, field, 1, 0))?;
            let len = w.to_u64().map_err(|e| invalid(e.to_string()))?;
            if len > MAX_ARRAY_LEN {
                return Err(invalid(format!("array length {len} exceeds limit")));
            }
            let mut items = Vec::with_capacity(len as usize);
            for _ in 0..len {
                items.push(decode_kind(reader, elem, field, event)?);
            }
            Ok(FieldValue::List(items))
        }
        FieldKind::Variant(variants) => {
            let w = reader.next().ok_or_else(|| truncated(event, field, 1, 0))?;
            let tag = w.to_u64().map_err(|e| invalid(e.to_string()))?;
            let def = variants
                .get(tag as usize)
                .ok_or(DecodeError::UnknownVariant {
                    event: event.to_string(),
                    field: field.to_string(),
                    tag,
                })?;
            let mut inner = Vec::with_capacity(def.fields.len());
            for f in &def.fields {
                inner.push((f.name.clone(), decode_field(reader, f, event)?));
            }
            Ok(FieldValue::Variant {
                name: def.name.clone(),
                fields: inner,
            })
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
