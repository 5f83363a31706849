use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keel_ops::{Fact, Operation};
use keel_state::StateEntry;
use keel_types::{Address, ContentHash, Height, NetworkId};

use crate::error::DigestError;

/// Header of a finalized block, as stored by the block writer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockManifest {
    pub height: Height,
    pub hash: ContentHash,
    pub previous: Option<ContentHash>,
    pub operations_tree: Option<ContentHash>,
    pub states_tree: Option<ContentHash>,
    pub network: NetworkId,
    pub proposed_at: DateTime<Utc>,
}

impl BlockManifest {
    /// Validate the manifest against the network this digester serves.
    pub fn ensure_network(&self, expected: &NetworkId) -> Result<(), DigestError> {
        self.hash.ensure_valid().map_err(|e| DigestError::InvalidManifest {
            height: self.height,
            reason: e.to_string(),
        })?;
        if self.network != *expected {
            return Err(DigestError::NetworkMismatch {
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Proposal metadata carried alongside a finalized block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockProposal {
    pub proposer: Address,
    pub round: u64,
}

/// Projection summary of one operation in a finalized block.
///
/// The envelope itself was validated before finalization; the digester
/// only needs the hashes and the processing outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockOperation {
    pub operation: ContentHash,
    pub fact: ContentHash,
    /// Whether the operation produced a state transition.
    pub in_state: bool,
    /// Processing reason for operations that did not reach state.
    pub reason: Option<String>,
}

impl BlockOperation {
    /// Summarize a validated envelope for projection.
    pub fn from_operation<F: Fact>(
        operation: &Operation<F>,
        in_state: bool,
        reason: Option<String>,
    ) -> Self {
        Self {
            operation: *operation.hash(),
            fact: *operation.fact().hash(),
            in_state,
            reason,
        }
    }
}

/// Bulk content of one finalized block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockItems {
    pub proposal: BlockProposal,
    pub operations: Vec<BlockOperation>,
    pub states: Vec<StateEntry>,
    pub confirmed_at: DateTime<Utc>,
}

/// Reader over finalized block content.
///
/// Absent content is `Ok(None)`, never an error; I/O failures are
/// propagated. Implementations must be cheap to call repeatedly: the
/// digester re-reads on every retry attempt.
#[async_trait]
pub trait BlockReader: Send + Sync {
    /// The manifest stored for a height, if any.
    async fn manifest(&self, height: Height) -> Result<Option<BlockManifest>, DigestError>;

    /// The bulk items of the block described by a manifest, if present.
    async fn block_items(
        &self,
        manifest: &BlockManifest,
    ) -> Result<Option<BlockItems>, DigestError>;
}

/// A reader that falls back to a remote fetch when local content is
/// absent.
///
/// Both sides share the [`BlockReader`] contract; the fallback fires only
/// on `Ok(None)`, so local errors still surface immediately.
pub struct FallbackBlockReader<L, R> {
    local: L,
    remote: R,
}

impl<L: BlockReader, R: BlockReader> FallbackBlockReader<L, R> {
    pub fn new(local: L, remote: R) -> Self {
        Self { local, remote }
    }
}

#[async_trait]
impl<L: BlockReader, R: BlockReader> BlockReader for FallbackBlockReader<L, R> {
    async fn manifest(&self, height: Height) -> Result<Option<BlockManifest>, DigestError> {
        if let Some(manifest) = self.local.manifest(height).await? {
            return Ok(Some(manifest));
        }
        tracing::debug!(%height, "manifest absent locally; fetching remotely");
        self.remote.manifest(height).await
    }

    async fn block_items(
        &self,
        manifest: &BlockManifest,
    ) -> Result<Option<BlockItems>, DigestError> {
        if let Some(items) = self.local.block_items(manifest).await? {
            return Ok(Some(items));
        }
        tracing::debug!(height = %manifest.height, "block items absent locally; fetching remotely");
        self.remote.block_items(manifest).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn network() -> NetworkId {
        NetworkId::from("keel-test")
    }

    fn manifest(height: u64) -> BlockManifest {
        BlockManifest {
            height: Height::new(height),
            hash: ContentHash::digest(&height.to_be_bytes()),
            previous: None,
            operations_tree: None,
            states_tree: None,
            network: network(),
            proposed_at: Utc::now(),
        }
    }

    /// Serves manifests below a cutoff height; counts calls.
    struct PartialReader {
        cutoff: u64,
        calls: AtomicUsize,
    }

    impl PartialReader {
        fn new(cutoff: u64) -> Self {
            Self {
                cutoff,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BlockReader for PartialReader {
        async fn manifest(&self, height: Height) -> Result<Option<BlockManifest>, DigestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((height.as_u64() < self.cutoff).then(|| manifest(height.as_u64())))
        }

        async fn block_items(
            &self,
            manifest: &BlockManifest,
        ) -> Result<Option<BlockItems>, DigestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((manifest.height.as_u64() < self.cutoff).then(|| BlockItems {
                proposal: BlockProposal {
                    proposer: Address::new("node0").unwrap(),
                    round: 0,
                },
                operations: vec![],
                states: vec![],
                confirmed_at: Utc::now(),
            }))
        }
    }

    #[test]
    fn ensure_network_accepts_matching() {
        manifest(3).ensure_network(&network()).unwrap();
    }

    #[test]
    fn block_operation_summarizes_a_signed_envelope() {
        use keel_crypto::SigningKey;
        use keel_types::Token;

        struct TransferFact {
            token: Token,
            hash: ContentHash,
        }

        impl Fact for TransferFact {
            fn hash(&self) -> &ContentHash {
                &self.hash
            }

            fn token(&self) -> &Token {
                &self.token
            }
        }

        let fact = TransferFact {
            token: Token::from("abc123"),
            hash: ContentHash::digest(b"transfer"),
        };
        let mut envelope = Operation::new(fact);
        envelope.sign(&SigningKey::generate(), &network()).unwrap();
        envelope.validate(&network()).unwrap();

        let summary = BlockOperation::from_operation(&envelope, true, None);
        assert_eq!(summary.operation, *envelope.hash());
        assert_eq!(summary.fact, *envelope.fact().hash());
        assert!(summary.in_state);
        assert!(summary.reason.is_none());
    }

    #[test]
    fn ensure_network_rejects_other_network() {
        let err = manifest(3)
            .ensure_network(&NetworkId::from("other-net"))
            .unwrap_err();
        assert!(matches!(err, DigestError::NetworkMismatch { .. }));
    }

    #[test]
    fn ensure_network_rejects_zero_hash() {
        let mut bad = manifest(3);
        bad.hash = ContentHash::zero();
        assert!(matches!(
            bad.ensure_network(&network()).unwrap_err(),
            DigestError::InvalidManifest { .. }
        ));
    }

    #[tokio::test]
    async fn fallback_prefers_local() {
        let reader = FallbackBlockReader::new(PartialReader::new(10), PartialReader::new(10));
        let found = reader.manifest(Height::new(5)).await.unwrap();
        assert!(found.is_some());
        assert_eq!(reader.local.calls.load(Ordering::SeqCst), 1);
        assert_eq!(reader.remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fallback_fetches_remotely_when_local_absent() {
        let reader = FallbackBlockReader::new(PartialReader::new(0), PartialReader::new(10));
        let found = reader.manifest(Height::new(5)).await.unwrap();
        assert!(found.is_some());
        assert_eq!(reader.remote.calls.load(Ordering::SeqCst), 1);

        let items = reader.block_items(&manifest(5)).await.unwrap();
        assert!(items.is_some());
    }

    #[tokio::test]
    async fn fallback_none_when_both_absent() {
        let reader = FallbackBlockReader::new(PartialReader::new(0), PartialReader::new(0));
        assert!(reader.manifest(Height::new(5)).await.unwrap().is_none());
    }
}
