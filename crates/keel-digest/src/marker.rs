use std::sync::RwLock;

use keel_store::DocumentStore;
use keel_types::Height;

use crate::error::DigestError;

/// Info key holding the persisted "last digested height".
pub const INFO_LAST_DIGESTED_HEIGHT: &str = "digest:last-height";

/// The persisted, monotonically non-decreasing "last digested height".
///
/// Readers (status queries) take the read side of the lock concurrently;
/// the single writer is the digestion worker, which persists the new
/// height through the store before updating the in-memory value.
pub struct HeightMarker {
    current: RwLock<Option<Height>>,
}

impl HeightMarker {
    /// Load the marker from the store's info entry.
    pub async fn load(store: &dyn DocumentStore) -> Result<Self, DigestError> {
        let current = store
            .get_info(INFO_LAST_DIGESTED_HEIGHT)
            .await?
            .and_then(decode_height);
        Ok(Self {
            current: RwLock::new(current),
        })
    }

    /// The last digested height, if any block has been digested.
    pub fn last(&self) -> Option<Height> {
        *self.current.read().expect("marker lock poisoned")
    }

    /// Advance the marker to `height`, persisting first.
    ///
    /// Heights at or below the current marker leave it unchanged.
    pub(crate) async fn advance(
        &self,
        height: Height,
        store: &dyn DocumentStore,
    ) -> Result<(), DigestError> {
        if self.last().is_some_and(|current| current >= height) {
            return Ok(());
        }
        store
            .set_info(INFO_LAST_DIGESTED_HEIGHT, &encode_height(height))
            .await?;
        *self.current.write().expect("marker lock poisoned") = Some(height);
        Ok(())
    }
}

pub(crate) fn encode_height(height: Height) -> [u8; 8] {
    height.as_u64().to_be_bytes()
}

pub(crate) fn decode_height(bytes: Vec<u8>) -> Option<Height> {
    <[u8; 8]>::try_from(bytes.as_slice())
        .ok()
        .map(|raw| Height::new(u64::from_be_bytes(raw)))
}
