use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use keel_store::{DocumentStore, Filter, IndexSpec};
use keel_types::{Height, NetworkId};

use crate::error::DigestError;
use crate::marker::{decode_height, encode_height, HeightMarker, INFO_LAST_DIGESTED_HEIGHT};
use crate::reader::BlockReader;
use crate::records::{collections, ManifestRecord, OperationRecord, StateRecord};
use crate::retry::RetryPolicy;

/// Handle to a finalized block awaiting digestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockHandle {
    pub height: Height,
}

impl BlockHandle {
    pub fn new(height: Height) -> Self {
        Self { height }
    }
}

/// A digestion failure published on the failure channel.
#[derive(Clone, Debug)]
pub struct DigestFailure {
    pub height: Height,
    pub error: String,
}

/// Configuration for a [`Digester`].
#[derive(Clone, Debug)]
pub struct DigesterConfig {
    /// Network every digested manifest must belong to.
    pub network: NetworkId,
    /// Bound of the internal block queue; producers block when full.
    pub queue_capacity: usize,
    /// Capacity of the failure broadcast channel.
    pub failure_capacity: usize,
    /// Retry policy wrapping each digestion step.
    pub retry: RetryPolicy,
}

impl DigesterConfig {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            queue_capacity: 100,
            failure_capacity: 256,
            retry: RetryPolicy::default(),
        }
    }
}

/// Single-consumer digestion pipeline.
///
/// Finalized-block handles go in through [`digest`](Self::digest); one
/// dedicated worker drains them in queue order and projects each block's
/// content into the secondary store. No two heights are ever digested
/// concurrently by the same instance, which keeps the idempotence check
/// and marker advancement race-free.
pub struct Digester {
    queue: mpsc::Sender<BlockHandle>,
    cancel: CancellationToken,
    failures: broadcast::Sender<DigestFailure>,
    marker: Arc<HeightMarker>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Digester {
    /// Prepare the store (collection indexes, persisted marker) and start
    /// the worker task.
    pub async fn spawn(
        config: DigesterConfig,
        reader: Arc<dyn BlockReader>,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, DigestError> {
        prepare_collections(store.as_ref()).await?;
        let marker = Arc::new(HeightMarker::load(store.as_ref()).await?);

        let (queue, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (failures, _) = broadcast::channel(config.failure_capacity.max(1));
        let cancel = CancellationToken::new();

        let worker = DigestWorker {
            rx,
            reader,
            store,
            config,
            marker: Arc::clone(&marker),
            failures: failures.clone(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(worker.run());

        Ok(Self {
            queue,
            cancel,
            failures,
            marker,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Enqueue a batch of block handles, lowest height first.
    ///
    /// Enqueueing blocks the caller while the queue is full; that is the
    /// pipeline's backpressure. Within one call blocks are processed in
    /// non-decreasing height order; across calls only FIFO queue order is
    /// guaranteed.
    pub async fn digest(&self, mut blocks: Vec<BlockHandle>) -> Result<(), DigestError> {
        blocks.sort_unstable_by_key(|block| block.height);
        for block in blocks {
            self.queue
                .send(block)
                .await
                .map_err(|_| DigestError::Stopped)?;
        }
        Ok(())
    }

    /// Subscribe to digestion failures. Best-effort: failures published
    /// while no receiver exists are dropped.
    pub fn failures(&self) -> broadcast::Receiver<DigestFailure> {
        self.failures.subscribe()
    }

    /// The last fully digested height, if any.
    pub fn last_digested_height(&self) -> Option<Height> {
        self.marker.last()
    }

    /// Cancel the worker and wait for it to stop.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self
            .worker
            .lock()
            .expect("digester lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

struct DigestWorker {
    rx: mpsc::Receiver<BlockHandle>,
    reader: Arc<dyn BlockReader>,
    store: Arc<dyn DocumentStore>,
    config: DigesterConfig,
    marker: Arc<HeightMarker>,
    failures: broadcast::Sender<DigestFailure>,
    cancel: CancellationToken,
}

enum StepOutcome {
    Digested { operations: usize, states: usize },
    AlreadyDigested,
}

impl DigestWorker {
    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("digester stopped");
                    break;
                }
                block = self.rx.recv() => match block {
                    Some(block) => self.handle_block(block).await,
                    None => {
                        debug!("digest queue closed");
                        break;
                    }
                }
            }
        }
    }

    async fn handle_block(&self, block: BlockHandle) {
        let height = block.height;
        let retry = &self.config.retry;
        match retry.run(&self.cancel, || self.digest_step(height)).await {
            Ok(StepOutcome::Digested { operations, states }) => {
                info!(%height, operations, states, "block digested");
            }
            Ok(StepOutcome::AlreadyDigested) => {
                debug!(%height, "height already digested; skipping");
            }
            Err(err) if err.is_cancelled() => {
                debug!(%height, "digestion cancelled");
            }
            Err(err) => {
                warn!(%height, error = %err, "digestion failed");
                let _ = self.failures.send(DigestFailure {
                    height,
                    error: err.to_string(),
                });
            }
        }
    }

    /// One digestion step: read, validate, check idempotence, project,
    /// advance the marker.
    async fn digest_step(&self, height: Height) -> Result<StepOutcome, DigestError> {
        let manifest = self
            .reader
            .manifest(height)
            .await?
            .ok_or(DigestError::ManifestNotFound { height })?;
        manifest.ensure_network(&self.config.network)?;

        let items = self
            .reader
            .block_items(&manifest)
            .await?
            .ok_or(DigestError::ItemsNotFound { height })?;

        // A manifest record at this height means a previous run already
        // committed the projection; re-entry must not write or move the
        // marker.
        let at_height = Filter::new().eq("height", height.as_u64());
        if self
            .store
            .get_one(collections::MANIFESTS, &at_height, None)
            .await?
            .is_some()
        {
            return Ok(StepOutcome::AlreadyDigested);
        }

        let mut session = self.store.session().await?;
        session.stage(
            collections::MANIFESTS,
            ManifestRecord::new(&manifest, &items).envelope()?,
        );
        for operation in &items.operations {
            session.stage(
                collections::OPERATIONS,
                OperationRecord::new(height, operation, items.confirmed_at).envelope()?,
            );
        }
        for entry in &items.states {
            session.stage(
                collections::STATES,
                StateRecord::new(entry.clone()).envelope()?,
            );
        }
        session.commit().await?;

        // Only a fully committed projection advances the marker.
        self.marker.advance(height, self.store.as_ref()).await?;

        Ok(StepOutcome::Digested {
            operations: items.operations.len(),
            states: items.states.len(),
        })
    }
}

async fn prepare_collections(store: &dyn DocumentStore) -> Result<(), DigestError> {
    store
        .create_index(
            collections::MANIFESTS,
            &IndexSpec::new("by-height", &["height"]).unique(),
        )
        .await?;
    store
        .create_index(
            collections::OPERATIONS,
            &IndexSpec::new("by-height", &["height"]),
        )
        .await?;
    store
        .create_index(collections::STATES, &IndexSpec::new("by-height", &["height"]))
        .await?;
    store
        .create_index(
            collections::STATES,
            &IndexSpec::new("by-key-height", &["key", "height"]),
        )
        .await?;
    Ok(())
}

/// Remove every projected record at or above `height` and rewind the
/// persisted marker, so the heights can be digested again.
///
/// Intended to run before a digester is spawned; a running worker would
/// race the deletes. Returns how many records were removed.
pub async fn clean_from(
    store: &dyn DocumentStore,
    height: Height,
) -> Result<u64, DigestError> {
    let filter = Filter::new().gte("height", height.as_u64());
    let mut removed = 0;
    for collection in collections::ALL {
        removed += store.bulk_delete(collection, &filter).await?;
    }

    let current = store
        .get_info(INFO_LAST_DIGESTED_HEIGHT)
        .await?
        .and_then(decode_height);
    if current.is_some_and(|current| current >= height) {
        if height == Height::GENESIS {
            // Nothing remains digested; an empty payload reads as "no
            // height digested yet".
            store.set_info(INFO_LAST_DIGESTED_HEIGHT, &[]).await?;
        } else {
            store
                .set_info(INFO_LAST_DIGESTED_HEIGHT, &encode_height(height.pred()))
                .await?;
        }
    }

    info!(%height, removed, "projected records cleaned for re-digestion");
    Ok(removed)
}
