use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keel_state::StateEntry;
use keel_store::{DecoderRegistry, RecordEnvelope, StoreError, StoreResult};
use keel_types::{Address, ContentHash, Height};

use crate::reader::{BlockItems, BlockManifest, BlockOperation};

/// Collections the digester projects into.
pub mod collections {
    pub const MANIFESTS: &str = "manifests";
    pub const OPERATIONS: &str = "operations";
    pub const STATES: &str = "states";

    pub const ALL: [&str; 3] = [MANIFESTS, OPERATIONS, STATES];
}

/// Projected manifest of one digested block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub height: Height,
    pub block: ContentHash,
    pub proposer: Address,
    pub round: u64,
    pub confirmed_at: DateTime<Utc>,
}

impl ManifestRecord {
    pub const TAG: &'static str = "digest-manifest-v1";

    pub fn new(manifest: &BlockManifest, items: &BlockItems) -> Self {
        Self {
            height: manifest.height,
            block: manifest.hash,
            proposer: items.proposal.proposer.clone(),
            round: items.proposal.round,
            confirmed_at: items.confirmed_at,
        }
    }

    pub fn envelope(&self) -> StoreResult<RecordEnvelope> {
        RecordEnvelope::rich(Self::TAG, self)
    }
}

/// Projected summary of one operation in a digested block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub height: Height,
    pub operation: ContentHash,
    pub fact: ContentHash,
    pub in_state: bool,
    pub reason: Option<String>,
    pub confirmed_at: DateTime<Utc>,
}

impl OperationRecord {
    pub const TAG: &'static str = "digest-operation-v1";

    pub fn new(height: Height, operation: &BlockOperation, confirmed_at: DateTime<Utc>) -> Self {
        Self {
            height,
            operation: operation.operation,
            fact: operation.fact,
            in_state: operation.in_state,
            reason: operation.reason.clone(),
            confirmed_at,
        }
    }

    pub fn envelope(&self) -> StoreResult<RecordEnvelope> {
        RecordEnvelope::rich(Self::TAG, self)
    }
}

/// Projected state entry of one digested block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub height: Height,
    pub key: String,
    pub entry: StateEntry,
}

impl StateRecord {
    pub const TAG: &'static str = "digest-state-v1";

    pub fn new(entry: StateEntry) -> Self {
        Self {
            height: entry.height(),
            key: entry.key().to_owned(),
            entry,
        }
    }

    pub fn envelope(&self) -> StoreResult<RecordEnvelope> {
        RecordEnvelope::rich(Self::TAG, self)
    }
}

/// Closed union of the records the digester persists.
#[derive(Clone, Debug, PartialEq)]
pub enum DigestRecord {
    Manifest(ManifestRecord),
    Operation(OperationRecord),
    State(StateRecord),
}

/// Build the decoder registry for digest records.
///
/// Constructed once at startup and passed by reference to any store
/// consumer that needs to round-trip persisted envelopes.
pub fn digest_decoders() -> StoreResult<DecoderRegistry<DigestRecord>> {
    let mut registry = DecoderRegistry::new();
    registry.register(ManifestRecord::TAG, |payload| {
        serde_json::from_value(payload.clone())
            .map(DigestRecord::Manifest)
            .map_err(|e| decode_error(ManifestRecord::TAG, e))
    })?;
    registry.register(OperationRecord::TAG, |payload| {
        serde_json::from_value(payload.clone())
            .map(DigestRecord::Operation)
            .map_err(|e| decode_error(OperationRecord::TAG, e))
    })?;
    registry.register(StateRecord::TAG, |payload| {
        serde_json::from_value(payload.clone())
            .map(DigestRecord::State)
            .map_err(|e| decode_error(StateRecord::TAG, e))
    })?;
    Ok(registry)
}

fn decode_error(tag: &str, err: serde_json::Error) -> StoreError {
    StoreError::Decode {
        tag: tag.to_owned(),
        reason: err.to_string(),
    }
}
