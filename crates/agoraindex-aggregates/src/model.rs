//! Aggregate field names, natural-key builders, and typed read views.
//!
//! Field ownership per event kind is disjoint by convention (each handler
//! module documents the fields it writes); the constants here are the
//! single source of the names.

use agoraindex_codec::{Address, Felt, U256};
use agoraindex_core::AggregateRow;

/// Field names shared by the aggregate entities.
pub mod fields {
    // monotonic accumulators
    pub const TOTAL_DEPOSITED: &str = "total_deposited";
    pub const TOTAL_CLAIMED: &str = "total_claimed";
    pub const CLAIMED_ALGO: &str = "claimed_algo";
    pub const CLAIMED_VOTE: &str = "claimed_vote";
    pub const TOTAL_TIPS: &str = "total_tips";

    // last-write-wins snapshots
    pub const CURRENT_EPOCH: &str = "current_epoch";
    pub const EPOCH_START: &str = "epoch_start";
    pub const EPOCH_END: &str = "epoch_end";
    pub const START_TIME: &str = "start_time";
    pub const END_TIME: &str = "end_time";
    pub const LATEST_SCORE: &str = "latest_score";
    pub const NAME: &str = "name";
    pub const KEYWORDS: &str = "keywords";
    pub const CREATOR: &str = "creator";
    pub const LINKED_ADDRESS: &str = "linked_address";
    pub const LINKED_BY_ADMIN: &str = "linked_by_admin";
    pub const DISPLAY_NAME: &str = "display_name";
    pub const BIO: &str = "bio";

    // row self-description on implicitly created rows
    pub const CONTRACT: &str = "contract";
    pub const EPOCH_INDEX: &str = "epoch_index";
    pub const USER_ID: &str = "user_id";
}

/// Natural-key builders. Keys are deterministic so replays hit the same row.
pub mod keys {
    use super::*;

    pub fn contract(address: &Address) -> String {
        address.to_string()
    }

    pub fn epoch(contract: &Address, epoch: u64) -> String {
        format!("{contract}:{epoch}")
    }

    pub fn user(user: &Felt) -> String {
        user.to_fixed_hex()
    }

    pub fn user_epoch(user: &Felt, contract: &Address, epoch: u64) -> String {
        format!("{}:{contract}:{epoch}", user.to_fixed_hex())
    }
}

// ─── Typed read views ────────────────────────────────────────────────────────

/// Per-contract running totals.
#[derive(Debug, Clone, Default)]
pub struct ContractStateView {
    pub total_deposited: U256,
    pub total_claimed: U256,
    pub total_tips: U256,
    pub current_epoch: Option<i64>,
    pub epoch_start: Option<i64>,
    pub epoch_end: Option<i64>,
    pub latest_score: U256,
    pub name: Option<String>,
    pub keywords: Vec<String>,
    pub creator: Option<String>,
    pub updated_at: i64,
}

impl ContractStateView {
    pub fn from_row(row: &AggregateRow) -> Self {
        Self {
            total_deposited: row.amount(fields::TOTAL_DEPOSITED),
            total_claimed: row.amount(fields::TOTAL_CLAIMED),
            total_tips: row.amount(fields::TOTAL_TIPS),
            current_epoch: row.integer(fields::CURRENT_EPOCH),
            epoch_start: row.integer(fields::EPOCH_START),
            epoch_end: row.integer(fields::EPOCH_END),
            latest_score: row.amount(fields::LATEST_SCORE),
            name: row.text(fields::NAME).map(str::to_string),
            keywords: row
                .text_list(fields::KEYWORDS)
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            creator: row.text(fields::CREATOR).map(str::to_string),
            updated_at: row.updated_at,
        }
    }
}

/// Per-epoch totals and window.
#[derive(Debug, Clone, Default)]
pub struct EpochStateView {
    pub epoch_index: Option<i64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub total_deposited: U256,
    pub total_claimed: U256,
    pub claimed_algo: U256,
    pub claimed_vote: U256,
    pub latest_score: U256,
    pub updated_at: i64,
}

impl EpochStateView {
    pub fn from_row(row: &AggregateRow) -> Self {
        Self {
            epoch_index: row.integer(fields::EPOCH_INDEX),
            start_time: row.integer(fields::START_TIME),
            end_time: row.integer(fields::END_TIME),
            total_deposited: row.amount(fields::TOTAL_DEPOSITED),
            total_claimed: row.amount(fields::TOTAL_CLAIMED),
            claimed_algo: row.amount(fields::CLAIMED_ALGO),
            claimed_vote: row.amount(fields::CLAIMED_VOTE),
            latest_score: row.amount(fields::LATEST_SCORE),
            updated_at: row.updated_at,
        }
    }
}

/// Cumulative per-user totals and identity linkage.
#[derive(Debug, Clone, Default)]
pub struct UserProfileView {
    pub total_deposited: U256,
    pub total_claimed: U256,
    pub total_tips: U256,
    pub latest_score: U256,
    pub linked_address: Option<String>,
    /// `true` when the linkage was asserted by an operator rather than the
    /// user themself.
    pub linked_by_admin: bool,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub updated_at: i64,
}

impl UserProfileView {
    pub fn from_row(row: &AggregateRow) -> Self {
        Self {
            total_deposited: row.amount(fields::TOTAL_DEPOSITED),
            total_claimed: row.amount(fields::TOTAL_CLAIMED),
            total_tips: row.amount(fields::TOTAL_TIPS),
            latest_score: row.amount(fields::LATEST_SCORE),
            linked_address: row.text(fields::LINKED_ADDRESS).map(str::to_string),
            linked_by_admin: row.boolean(fields::LINKED_BY_ADMIN).unwrap_or(false),
            display_name: row.text(fields::DISPLAY_NAME).map(str::to_string),
            bio: row.text(fields::BIO).map(str::to_string),
            updated_at: row.updated_at,
        }
    }
}

/// Per-user-per-epoch totals.
#[derive(Debug, Clone, Default)]
pub struct UserEpochStateView {
    pub total_deposited: U256,
    pub total_claimed: U256,
    pub claimed_algo: U256,
    pub claimed_vote: U256,
    pub latest_score: U256,
    pub updated_at: i64,
}

impl UserEpochStateView {
    pub fn from_row(row: &AggregateRow) -> Self {
        Self {
            total_deposited: row.amount(fields::TOTAL_DEPOSITED),
            total_claimed: row.amount(fields::TOTAL_CLAIMED),
            claimed_algo: row.amount(fields::CLAIMED_ALGO),
            claimed_vote: row.amount(fields::CLAIMED_VOTE),
            latest_score: row.amount(fields::LATEST_SCORE),
            updated_at: row.updated_at,
        }
    }
}
