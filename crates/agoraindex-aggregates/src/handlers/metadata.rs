//! Descriptive-metadata handlers.
//!
//! Own the non-numeric fields: `name`/`keywords` on `ContractState` and
//! `display_name`/`bio` on `UserProfile`. List-valued fields are replaced
//! wholesale so replays can never grow them.

use agoraindex_codec::{event_selector, DecodedEvent, Felt};
use agoraindex_core::{
    BatchContext, EntityKind, EntityUpsert, EventHandler, HandlerError, StoreValue,
};

use crate::events::{ProfileMetadataAdded, TopicMetadataAdded};
use crate::model::{fields, keys};
use crate::selectors::names;

/// Upserts a topic's display name and keyword list.
pub struct TopicMetadataHandler;

impl EventHandler for TopicMetadataHandler {
    fn name(&self) -> &str {
        "topic-metadata"
    }

    fn selectors(&self) -> Vec<Felt> {
        vec![event_selector(names::TOPIC_METADATA_ADDED)]
    }

    fn handle(
        &self,
        event: &DecodedEvent,
        _ctx: &BatchContext,
    ) -> Result<Vec<EntityUpsert>, HandlerError> {
        let ev = TopicMetadataAdded::from_event(event)?;
        Ok(vec![EntityUpsert::new(
            EntityKind::ContractState,
            keys::contract(&event.address),
            event.position(),
        )
        .set(fields::NAME, StoreValue::Text(ev.name))
        .set(fields::KEYWORDS, StoreValue::TextList(ev.keywords))])
    }
}

/// Upserts a user's display name and bio.
pub struct ProfileMetadataHandler;

impl EventHandler for ProfileMetadataHandler {
    fn name(&self) -> &str {
        "profile-metadata"
    }

    fn selectors(&self) -> Vec<Felt> {
        vec![event_selector(names::PROFILE_METADATA_ADDED)]
    }

    fn handle(
        &self,
        event: &DecodedEvent,
        _ctx: &BatchContext,
    ) -> Result<Vec<EntityUpsert>, HandlerError> {
        let ev = ProfileMetadataAdded::from_event(event)?;
        Ok(vec![EntityUpsert::new(
            EntityKind::UserProfile,
            keys::user(&ev.user),
            event.position(),
        )
        .set(fields::DISPLAY_NAME, StoreValue::Text(ev.display_name))
        .set(fields::BIO, StoreValue::Text(ev.bio))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agoraindex_codec::FieldValue;

    use crate::testutil::{ctx, decoded};

    #[test]
    fn topic_metadata_replaces_keywords() {
        let ev = decoded(
            names::TOPIC_METADATA_ADDED,
            0xC0,
            30,
            0,
            vec![
                ("name", FieldValue::Text("Generative Art".into())),
                (
                    "keywords",
                    FieldValue::List(vec![
                        FieldValue::Text("art".into()),
                        FieldValue::Text("ai".into()),
                    ]),
                ),
            ],
        );
        let ups = TopicMetadataHandler.handle(&ev, &ctx(30)).unwrap();
        assert_eq!(ups.len(), 1);
        assert!(ups[0].ops.iter().any(|(f, op)| {
            f == fields::KEYWORDS
                && matches!(op, agoraindex_core::MergeOp::Set(StoreValue::TextList(kw)) if kw.len() == 2)
        }));
    }

    #[test]
    fn profile_metadata_targets_the_user_row() {
        let ev = decoded(
            names::PROFILE_METADATA_ADDED,
            0xAB,
            31,
            0,
            vec![
                ("user_id", FieldValue::Felt(Felt::from_u64(0x55))),
                ("display_name", FieldValue::Text("nadia".into())),
                ("bio", FieldValue::Text("curator".into())),
            ],
        );
        let ups = ProfileMetadataHandler.handle(&ev, &ctx(31)).unwrap();
        assert_eq!(ups[0].entity, EntityKind::UserProfile);
        assert_eq!(ups[0].key, Felt::from_u64(0x55).to_fixed_hex());
    }
}
