use keel_types::TypeError;
use thiserror::Error;

/// Errors produced by state construction and merging.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("state key is empty")]
    EmptyKey,

    #[error("nothing accumulated for this key; no entry to close")]
    NothingToCommit,

    #[error("stored content hash does not match recomputation")]
    HashMismatch,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl StateError {
    /// Returns `true` for the recoverable "nothing to commit" kind.
    /// Callers treat it as "no-op for this key", not as a fault.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::NothingToCommit)
    }
}
