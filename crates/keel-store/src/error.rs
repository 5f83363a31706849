use thiserror::Error;

/// Errors produced by store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("type tag {tag:?} is already registered")]
    DuplicateTypeTag { tag: String },

    #[error("no decoder registered for type tag {tag:?}")]
    UnknownTypeTag { tag: String },

    #[error("decoding {tag:?} record failed: {reason}")]
    Decode { tag: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
