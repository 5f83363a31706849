//! Asynchronous block digestion pipeline for the Keel ledger runtime.
//!
//! The [`Digester`] consumes a stream of finalized-block handles and
//! durably projects their content (manifest, operations, resulting state
//! entries) into a secondary [`DocumentStore`](keel_store::DocumentStore),
//! exactly once per height, with bounded retry and graceful cancellation.
//!
//! Producers funnel batches through [`Digester::digest`] into a bounded
//! queue (enqueueing blocks when the queue is full); a single worker task
//! drains it, so no two heights are ever digested concurrently by the same
//! instance. Re-entry after a crash or cancellation is safe because the
//! digestion step checks the store for an existing manifest record before
//! projecting anything.

pub mod digester;
pub mod error;
pub mod marker;
pub mod reader;
pub mod records;
pub mod retry;

pub use digester::{clean_from, BlockHandle, DigestFailure, Digester, DigesterConfig};
pub use error::DigestError;
pub use marker::{HeightMarker, INFO_LAST_DIGESTED_HEIGHT};
pub use reader::{
    BlockItems, BlockManifest, BlockOperation, BlockProposal, BlockReader, FallbackBlockReader,
};
pub use records::{
    collections, digest_decoders, DigestRecord, ManifestRecord, OperationRecord, StateRecord,
};
pub use retry::RetryPolicy;
