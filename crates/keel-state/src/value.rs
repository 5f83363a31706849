use serde::{Deserialize, Serialize};

use keel_crypto::ContentHasher;
use keel_types::ContentHash;

use crate::error::StateError;

/// An opaque, fully-resolved state value with a deterministic content hash.
///
/// Callers supply resolved values, never deltas: merging is last-writer-wins
/// on the whole value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateValue {
    payload: serde_json::Value,
    hash: ContentHash,
}

impl StateValue {
    pub fn new(payload: serde_json::Value) -> Result<Self, StateError> {
        let encoded = serde_json::to_vec(&payload)
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let hash = ContentHasher::VALUE.hash(&encoded);
        Ok(Self { payload, hash })
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }
}
