//! Typed platform events — the closed set of kinds the handlers consume.
//!
//! The schema registry produces generic `DecodedEvent`s; these conversions
//! lift them into concrete per-kind structs so handlers never touch
//! loosely-typed fields. Conversions are total over well-shaped events: an
//! absent optional sub-field (a zero user id) becomes `None`, it never
//! fails the event.

use agoraindex_codec::{Address, DecodedEvent, Felt, FieldValue, U256};
use agoraindex_core::HandlerError;

use crate::selectors::names;

fn rejected(ev: &DecodedEvent, reason: impl Into<String>) -> HandlerError {
    HandlerError::Rejected {
        event: ev.name.clone(),
        reason: reason.into(),
    }
}

fn require<'a>(ev: &'a DecodedEvent, field: &str) -> Result<&'a FieldValue, HandlerError> {
    ev.field(field)
        .ok_or_else(|| rejected(ev, format!("missing field '{field}'")))
}

fn require_u64(ev: &DecodedEvent, field: &str) -> Result<u64, HandlerError> {
    require(ev, field)?
        .as_u64()
        .ok_or_else(|| rejected(ev, format!("field '{field}' is not a u64")))
}

fn require_u256(ev: &DecodedEvent, field: &str) -> Result<U256, HandlerError> {
    require(ev, field)?
        .as_u256()
        .copied()
        .ok_or_else(|| rejected(ev, format!("field '{field}' is not a u256")))
}

fn require_address(ev: &DecodedEvent, field: &str) -> Result<Address, HandlerError> {
    require(ev, field)?
        .as_address()
        .copied()
        .ok_or_else(|| rejected(ev, format!("field '{field}' is not an address")))
}

fn require_text(ev: &DecodedEvent, field: &str) -> Result<String, HandlerError> {
    require(ev, field)?
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| rejected(ev, format!("field '{field}' is not a string")))
}

/// A user-id field: the zero word means "no user attached".
fn optional_user(ev: &DecodedEvent, field: &str) -> Result<Option<Felt>, HandlerError> {
    let id = require(ev, field)?
        .as_felt()
        .copied()
        .ok_or_else(|| rejected(ev, format!("field '{field}' is not a felt")))?;
    Ok(if id.is_zero() { None } else { Some(id) })
}

fn require_user(ev: &DecodedEvent, field: &str) -> Result<Felt, HandlerError> {
    optional_user(ev, field)?.ok_or_else(|| rejected(ev, format!("field '{field}' is zero")))
}

// ─── Event kinds ─────────────────────────────────────────────────────────────

/// Hub contract announced a newly created topic contract.
#[derive(Debug, Clone)]
pub struct TopicCreated {
    pub topic: Address,
    pub creator: Address,
    pub name: String,
}

impl TopicCreated {
    pub fn from_event(ev: &DecodedEvent) -> Result<Self, HandlerError> {
        Ok(Self {
            topic: require_address(ev, "topic")?,
            creator: require_address(ev, "creator")?,
            name: require_text(ev, "name")?,
        })
    }
}

/// A topic contract opened a new epoch.
#[derive(Debug, Clone, Copy)]
pub struct EpochAdvanced {
    pub epoch: u64,
    pub start_time: u64,
    pub end_time: u64,
}

impl EpochAdvanced {
    pub fn from_event(ev: &DecodedEvent) -> Result<Self, HandlerError> {
        Ok(Self {
            epoch: require_u64(ev, "epoch")?,
            start_time: require_u64(ev, "start_time")?,
            end_time: require_u64(ev, "end_time")?,
        })
    }
}

/// Rewards were deposited into an epoch's pool.
#[derive(Debug, Clone)]
pub struct RewardsDeposited {
    pub epoch: u64,
    pub depositor: Address,
    /// Stable platform identity, when the depositor is a known user.
    pub user: Option<Felt>,
    pub amount: U256,
}

impl RewardsDeposited {
    pub fn from_event(ev: &DecodedEvent) -> Result<Self, HandlerError> {
        Ok(Self {
            epoch: require_u64(ev, "epoch")?,
            depositor: require_address(ev, "depositor")?,
            user: optional_user(ev, "user_id")?,
            amount: require_u256(ev, "amount")?,
        })
    }
}

/// Rewards were paid out, split into the algorithmic and vote-weighted
/// portions.
#[derive(Debug, Clone)]
pub struct RewardsDistributed {
    pub epoch: u64,
    pub recipient: Address,
    pub user: Option<Felt>,
    pub amount_algo: U256,
    pub amount_vote: U256,
}

impl RewardsDistributed {
    pub fn from_event(ev: &DecodedEvent) -> Result<Self, HandlerError> {
        Ok(Self {
            epoch: require_u64(ev, "epoch")?,
            recipient: require_address(ev, "recipient")?,
            user: optional_user(ev, "user_id")?,
            amount_algo: require_u256(ev, "amount_algo")?,
            amount_vote: require_u256(ev, "amount_vote")?,
        })
    }

    /// Combined payout.
    pub fn total(&self) -> U256 {
        self.amount_algo.saturating_add(&self.amount_vote)
    }
}

/// A fresh AI-derived score; supersedes any prior score.
#[derive(Debug, Clone, Copy)]
pub struct ScorePushed {
    pub user: Felt,
    pub epoch: u64,
    pub score: U256,
}

impl ScorePushed {
    pub fn from_event(ev: &DecodedEvent) -> Result<Self, HandlerError> {
        Ok(Self {
            user: require_user(ev, "user_id")?,
            epoch: require_u64(ev, "epoch")?,
            score: require_u256(ev, "score")?,
        })
    }
}

/// Who asserted an address linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrigin {
    SelfClaimed,
    Admin { operator: Address },
}

/// A secondary address was linked to a platform identity.
#[derive(Debug, Clone)]
pub struct AddressLinked {
    pub user: Felt,
    pub linked: Address,
    pub origin: LinkOrigin,
}

impl AddressLinked {
    pub fn from_event(ev: &DecodedEvent) -> Result<Self, HandlerError> {
        let origin = match require(ev, "origin")? {
            FieldValue::Variant { name, fields } => match name.as_str() {
                "SelfClaimed" => LinkOrigin::SelfClaimed,
                "Admin" => {
                    let operator = fields
                        .iter()
                        .find(|(n, _)| n == "operator")
                        .and_then(|(_, v)| v.as_address())
                        .copied()
                        .ok_or_else(|| rejected(ev, "admin origin missing operator"))?;
                    LinkOrigin::Admin { operator }
                }
                other => return Err(rejected(ev, format!("unknown link origin '{other}'"))),
            },
            _ => return Err(rejected(ev, "field 'origin' is not a variant")),
        };
        Ok(Self {
            user: require_user(ev, "user_id")?,
            linked: require_address(ev, "linked")?,
            origin,
        })
    }

    pub fn by_admin(&self) -> bool {
        matches!(self.origin, LinkOrigin::Admin { .. })
    }
}

/// A tip was sent to a topic.
#[derive(Debug, Clone)]
pub struct TipSent {
    pub sender: Address,
    pub user: Option<Felt>,
    pub amount: U256,
}

impl TipSent {
    pub fn from_event(ev: &DecodedEvent) -> Result<Self, HandlerError> {
        Ok(Self {
            sender: require_address(ev, "sender")?,
            user: optional_user(ev, "user_id")?,
            amount: require_u256(ev, "amount")?,
        })
    }
}

/// Descriptive topic metadata. Keyword lists replace the stored list.
#[derive(Debug, Clone)]
pub struct TopicMetadataAdded {
    pub name: String,
    pub keywords: Vec<String>,
}

impl TopicMetadataAdded {
    pub fn from_event(ev: &DecodedEvent) -> Result<Self, HandlerError> {
        let keywords = require(ev, "keywords")?
            .as_list()
            .ok_or_else(|| rejected(ev, "field 'keywords' is not a list"))?
            .iter()
            .filter_map(|v| v.as_text().map(str::to_string))
            .collect();
        Ok(Self {
            name: require_text(ev, "name")?,
            keywords,
        })
    }
}

/// Descriptive profile metadata.
#[derive(Debug, Clone)]
pub struct ProfileMetadataAdded {
    pub user: Felt,
    pub display_name: String,
    pub bio: String,
}

impl ProfileMetadataAdded {
    pub fn from_event(ev: &DecodedEvent) -> Result<Self, HandlerError> {
        Ok(Self {
            user: require_user(ev, "user_id")?,
            display_name: require_text(ev, "display_name")?,
            bio: require_text(ev, "bio")?,
        })
    }
}

/// The closed set of platform event kinds.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    TopicCreated(TopicCreated),
    EpochAdvanced(EpochAdvanced),
    RewardsDeposited(RewardsDeposited),
    RewardsDistributed(RewardsDistributed),
    ScorePushed(ScorePushed),
    AddressLinked(AddressLinked),
    TipSent(TipSent),
    TopicMetadataAdded(TopicMetadataAdded),
    ProfileMetadataAdded(ProfileMetadataAdded),
}

impl PlatformEvent {
    /// Lift a decoded event into its typed kind; `None` for kinds outside
    /// the platform set.
    pub fn from_decoded(ev: &DecodedEvent) -> Result<Option<Self>, HandlerError> {
        let kind = match ev.name.as_str() {
            names::TOPIC_CREATED => Self::TopicCreated(TopicCreated::from_event(ev)?),
            names::EPOCH_ADVANCED => Self::EpochAdvanced(EpochAdvanced::from_event(ev)?),
            names::REWARDS_DEPOSITED => {
                Self::RewardsDeposited(RewardsDeposited::from_event(ev)?)
            }
            names::REWARDS_DISTRIBUTED => {
                Self::RewardsDistributed(RewardsDistributed::from_event(ev)?)
            }
            names::SCORE_PUSHED => Self::ScorePushed(ScorePushed::from_event(ev)?),
            names::ADDRESS_LINKED => Self::AddressLinked(AddressLinked::from_event(ev)?),
            names::TIP_SENT => Self::TipSent(TipSent::from_event(ev)?),
            names::TOPIC_METADATA_ADDED => {
                Self::TopicMetadataAdded(TopicMetadataAdded::from_event(ev)?)
            }
            names::PROFILE_METADATA_ADDED => {
                Self::ProfileMetadataAdded(ProfileMetadataAdded::from_event(ev)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(kind))
    }
}
