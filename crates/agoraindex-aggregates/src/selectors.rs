//! Event names and the selector sets each contract family emits.

use agoraindex_codec::{event_selector, Felt};

/// Canonical event names. Selectors are derived from these at startup.
pub mod names {
    /// Hub (factory) contract announcing a new topic contract.
    pub const TOPIC_CREATED: &str = "TopicCreated";
    pub const EPOCH_ADVANCED: &str = "EpochAdvanced";
    pub const REWARDS_DEPOSITED: &str = "RewardsDeposited";
    pub const REWARDS_DISTRIBUTED: &str = "RewardsDistributed";
    pub const SCORE_PUSHED: &str = "ScorePushed";
    pub const TIP_SENT: &str = "TipSent";
    pub const TOPIC_METADATA_ADDED: &str = "TopicMetadataAdded";
    pub const ADDRESS_LINKED: &str = "AddressLinked";
    pub const PROFILE_METADATA_ADDED: &str = "ProfileMetadataAdded";
}

/// Selectors emitted by a topic contract. This is the set the factory
/// registers for every newly announced topic address.
pub fn topic_selectors() -> Vec<Felt> {
    [
        names::EPOCH_ADVANCED,
        names::REWARDS_DEPOSITED,
        names::REWARDS_DISTRIBUTED,
        names::SCORE_PUSHED,
        names::TIP_SENT,
        names::TOPIC_METADATA_ADDED,
    ]
    .iter()
    .map(|n| event_selector(n))
    .collect()
}

/// Selectors emitted by the hub (factory) contract.
pub fn hub_selectors() -> Vec<Felt> {
    vec![event_selector(names::TOPIC_CREATED)]
}

/// Selectors emitted by the profile/identity contract.
pub fn profile_selectors() -> Vec<Felt> {
    vec![
        event_selector(names::ADDRESS_LINKED),
        event_selector(names::PROFILE_METADATA_ADDED),
    ]
}
