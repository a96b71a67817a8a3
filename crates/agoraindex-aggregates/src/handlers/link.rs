//! Address-linkage handler.
//!
//! Owns `linked_address` and `linked_by_admin` on `UserProfile`. The
//! provenance flag distinguishes operator-asserted linkage from a user's
//! own claim.

use agoraindex_codec::{event_selector, DecodedEvent, Felt};
use agoraindex_core::{
    BatchContext, EntityKind, EntityUpsert, EventHandler, HandlerError, StoreValue,
};
use tracing::debug;

use crate::events::{AddressLinked, LinkOrigin};
use crate::model::{fields, keys};
use crate::selectors::names;

/// Upserts a user's secondary-address linkage.
pub struct AddressLinkedHandler;

impl EventHandler for AddressLinkedHandler {
    fn name(&self) -> &str {
        "address-linked"
    }

    fn selectors(&self) -> Vec<Felt> {
        vec![event_selector(names::ADDRESS_LINKED)]
    }

    fn handle(
        &self,
        event: &DecodedEvent,
        _ctx: &BatchContext,
    ) -> Result<Vec<EntityUpsert>, HandlerError> {
        let ev = AddressLinked::from_event(event)?;
        if let LinkOrigin::Admin { operator } = &ev.origin {
            debug!(user = %ev.user, operator = %operator, "admin-asserted address link");
        }

        Ok(vec![EntityUpsert::new(
            EntityKind::UserProfile,
            keys::user(&ev.user),
            event.position(),
        )
        .set(fields::LINKED_ADDRESS, StoreValue::Text(ev.linked.to_string()))
        .set(fields::LINKED_BY_ADMIN, StoreValue::Bool(ev.by_admin()))])
    }
}
