//! Decoding shapes for every platform event kind.
//!
//! The registry is assembled once at startup and injected wherever decode
//! happens; nothing here is global or mutable.

use agoraindex_codec::{EventShape, FieldDef, FieldKind, SchemaRegistry, VariantDef};

use crate::selectors::names;

fn felt(name: &str) -> FieldDef {
    FieldDef::new(name, FieldKind::Felt)
}

fn address(name: &str) -> FieldDef {
    FieldDef::new(name, FieldKind::Address)
}

fn u64_(name: &str) -> FieldDef {
    FieldDef::new(name, FieldKind::Uint64)
}

fn u256(name: &str) -> FieldDef {
    FieldDef::new(name, FieldKind::Uint256)
}

fn byte_array(name: &str) -> FieldDef {
    FieldDef::new(name, FieldKind::ByteArray)
}

/// All platform event shapes.
pub fn shapes() -> Vec<EventShape> {
    vec![
        EventShape::new(
            names::TOPIC_CREATED,
            vec![address("topic")],
            vec![address("creator"), byte_array("name")],
        ),
        EventShape::new(
            names::EPOCH_ADVANCED,
            vec![u64_("epoch")],
            vec![u64_("start_time"), u64_("end_time")],
        ),
        EventShape::new(
            names::REWARDS_DEPOSITED,
            vec![u64_("epoch"), address("depositor")],
            vec![felt("user_id"), u256("amount")],
        ),
        EventShape::new(
            names::REWARDS_DISTRIBUTED,
            vec![u64_("epoch"), address("recipient")],
            vec![felt("user_id"), u256("amount_algo"), u256("amount_vote")],
        ),
        EventShape::new(
            names::SCORE_PUSHED,
            vec![felt("user_id")],
            vec![u64_("epoch"), u256("score")],
        ),
        EventShape::new(
            names::TIP_SENT,
            vec![address("sender")],
            vec![felt("user_id"), u256("amount")],
        ),
        EventShape::new(
            names::TOPIC_METADATA_ADDED,
            vec![],
            vec![
                byte_array("name"),
                FieldDef::new("keywords", FieldKind::Array(Box::new(FieldKind::ShortString))),
            ],
        ),
        EventShape::new(
            names::ADDRESS_LINKED,
            vec![felt("user_id")],
            vec![
                address("linked"),
                FieldDef::new(
                    "origin",
                    FieldKind::Variant(vec![
                        VariantDef::new("SelfClaimed", vec![]),
                        VariantDef::new("Admin", vec![address("operator")]),
                    ]),
                ),
            ],
        ),
        EventShape::new(
            names::PROFILE_METADATA_ADDED,
            vec![felt("user_id")],
            vec![byte_array("display_name"), byte_array("bio")],
        ),
    ]
}

/// Build the full platform schema registry.
pub fn build_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    for shape in shapes() {
        // selectors derive from distinct names; duplicates cannot occur
        if let Err(e) = registry.register(shape) {
            unreachable!("duplicate platform shape: {e}");
        }
    }
    registry
}
