//! Error types for the word codec and decode pipeline.

use thiserror::Error;

/// Errors from parsing or converting a single field-element word.
#[derive(Debug, Error)]
pub enum FeltError {
    #[error("invalid hex: {reason}")]
    InvalidHex { reason: String },

    #[error("value exceeds the field width (252 bits)")]
    FieldOverflow,

    #[error("word does not fit target type {target}")]
    Narrowing { target: &'static str },

    #[error("invalid UTF-8 in short string: {reason}")]
    InvalidShortString { reason: String },
}

/// Errors that can occur while decoding a single event.
///
/// `UnknownSelector` and `TruncatedEvent` are expected in normal operation
/// (new on-chain event kinds, shape drift) — callers skip the event and log,
/// they never abort the batch.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no shape registered for selector {selector}")]
    UnknownSelector { selector: String },

    #[error("event '{event}' truncated: field '{field}' needs {needed} more word(s), {available} available")]
    TruncatedEvent {
        event: String,
        field: String,
        needed: usize,
        available: usize,
    },

    #[error("event has no selector key")]
    MissingSelector,

    #[error("invalid byte array in '{event}': {reason}")]
    InvalidByteArray { event: String, reason: String },

    #[error("field '{field}' of '{event}' invalid: {reason}")]
    InvalidField {
        event: String,
        field: String,
        reason: String,
    },

    #[error("unknown variant tag {tag} for field '{field}' of '{event}'")]
    UnknownVariant {
        event: String,
        field: String,
        tag: u64,
    },

    #[error(transparent)]
    Felt(#[from] FeltError),
}

/// Errors from the schema registry itself.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("shape '{name}' already registered for selector {selector}")]
    AlreadyRegistered { name: String, selector: String },
}
