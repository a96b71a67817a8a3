//! Aggregation handlers — one per event kind.
//!
//! Each handler is a pure computation from a decoded event to the entity
//! upserts it implies; the upsert engine owns the store writes. Field
//! ownership is disjoint per event kind (see each module's header), which
//! is what lets independent indexer processes co-write `UserProfile` rows
//! safely.

pub mod epoch;
pub mod link;
pub mod metadata;
pub mod rewards;
pub mod score;
pub mod tips;

pub use epoch::EpochAdvancedHandler;
pub use link::AddressLinkedHandler;
pub use metadata::{ProfileMetadataHandler, TopicMetadataHandler};
pub use rewards::{RewardsDepositedHandler, RewardsDistributedHandler};
pub use score::ScorePushedHandler;
pub use tips::TipSentHandler;

use std::sync::Arc;

use agoraindex_core::{Dispatcher, SharedFilterSet};

use crate::factory::TopicCreatedHandler;

/// Register the full platform handler set, factory expansion included.
pub fn register_all(dispatcher: &mut Dispatcher, filter: SharedFilterSet) {
    dispatcher.register(Arc::new(TopicCreatedHandler::new(filter)));
    dispatcher.register(Arc::new(EpochAdvancedHandler));
    dispatcher.register(Arc::new(RewardsDepositedHandler));
    dispatcher.register(Arc::new(RewardsDistributedHandler));
    dispatcher.register(Arc::new(ScorePushedHandler));
    dispatcher.register(Arc::new(AddressLinkedHandler));
    dispatcher.register(Arc::new(TipSentHandler));
    dispatcher.register(Arc::new(TopicMetadataHandler));
    dispatcher.register(Arc::new(ProfileMetadataHandler));
}

#[cfg(test)]
mod tests {
    use super::*;
    use agoraindex_core::filter;

    #[test]
    fn register_all_wires_every_kind() {
        let mut dispatcher = Dispatcher::new();
        register_all(&mut dispatcher, filter::shared(vec![]));
        assert_eq!(dispatcher.handler_count(), 9);
    }
}
