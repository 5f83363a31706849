use keel_store::StoreError;
use keel_types::Height;
use thiserror::Error;

/// Errors produced by the digestion pipeline.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("no manifest found for height {height}")]
    ManifestNotFound { height: Height },

    #[error("no block items found for height {height}")]
    ItemsNotFound { height: Height },

    #[error("manifest at height {height} belongs to another network")]
    NetworkMismatch { height: Height },

    #[error("manifest at height {height} is invalid: {reason}")]
    InvalidManifest { height: Height, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("block reader error: {0}")]
    Reader(String),

    #[error("digester is stopped")]
    Stopped,

    #[error("digestion cancelled")]
    Cancelled,

    #[error("digestion gave up after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        source: Box<DigestError>,
    },
}

impl DigestError {
    /// Returns `true` when the error is the cancellation signal, which
    /// aborts retry loops instead of being retried.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
