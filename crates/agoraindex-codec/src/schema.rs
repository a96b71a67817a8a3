//! Event shapes — the declarative description the registry decodes by.
//!
//! A shape lists, in order, the typed fields carried in an event's key
//! words and data words. Multi-word fields (`Uint256`, byte arrays,
//! arrays, variants) declare a single logical field consuming several
//! physical words; the registry's word bookkeeping is explicit so a shape
//! mismatch surfaces as `TruncatedEvent` instead of misreading.

use crate::felt::Felt;
use crate::selector::event_selector;

/// Semantic type of one logical field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// One opaque field element.
    Felt,
    /// One word, viewed as a normalized address.
    Address,
    /// One word, narrowed to `u64`.
    Uint64,
    /// Two limb words (`low`, `high`).
    Uint256,
    /// One word, must be 0 or 1.
    Bool,
    /// One word, ≤ 31 packed ASCII bytes.
    ShortString,
    /// Length-prefixed chunked string (variable word count).
    ByteArray,
    /// Count-prefixed homogeneous array.
    Array(Box<FieldKind>),
    /// Tag-word-keyed variant record with per-variant nested fields.
    Variant(Vec<VariantDef>),
}

/// One arm of a `FieldKind::Variant`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl VariantDef {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self { name: name.into(), fields }
    }
}

/// A named, typed logical field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// The decoding shape for one event kind.
///
/// Key fields follow the selector (which always occupies `keys[0]` and is
/// not declared); data fields occupy the data words from position 0.
#[derive(Debug, Clone)]
pub struct EventShape {
    pub name: String,
    pub selector: Felt,
    pub keys: Vec<FieldDef>,
    pub data: Vec<FieldDef>,
}

impl EventShape {
    /// Declare a shape; the selector is derived from the event name.
    pub fn new(name: impl Into<String>, keys: Vec<FieldDef>, data: Vec<FieldDef>) -> Self {
        let name = name.into();
        let selector = event_selector(&name);
        Self { name, selector, keys, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_derives_selector_from_name() {
        let shape = EventShape::new(
            "EpochAdvanced",
            vec![FieldDef::new("epoch", FieldKind::Uint64)],
            vec![FieldDef::new("start_time", FieldKind::Uint64)],
        );
        assert_eq!(shape.selector, event_selector("EpochAdvanced"));
        assert_eq!(shape.keys.len(), 1);
        assert_eq!(shape.data.len(), 1);
    }
}
