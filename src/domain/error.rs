//! # Domain Errors
//!
//! Error taxonomy for the state store and the roster engine.

use thiserror::Error;

/// Failures of the underlying key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt value under key `{key}`: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcomes of roster mutations and reads that callers report back to chat.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Player already added.")]
    AlreadyAdded,

    #[error("Player already removed.")]
    AlreadyRemoved,

    #[error("Cant load roster")]
    CannotLoadRoster(#[source] StoreError),

    #[error(transparent)]
    StorageUnavailable(#[from] StoreError),
}

pub type RosterResult<T> = Result<T, RosterError>;
