//! Document-store contract for the Keel ledger runtime.
//!
//! The digestion pipeline projects ledger content into a secondary,
//! independently queryable store. This crate defines the contract that
//! store must satisfy ([`DocumentStore`] and [`ProjectionSession`]), the
//! wire shape of every persisted record ([`RecordEnvelope`]), the decoder
//! registry that recovers typed records from envelopes, and an in-memory
//! backend for tests and embedding.
//!
//! "Record absent" is expressed as `Ok(None)`, never as an error; all I/O
//! failures are propagated.

pub mod envelope;
pub mod error;
pub mod filter;
pub mod memory;
pub mod traits;

pub use envelope::{Decoded, DecoderRegistry, RecordEnvelope};
pub use error::{StoreError, StoreResult};
pub use filter::{Filter, IndexSpec, Sort};
pub use memory::InMemoryDocumentStore;
pub use traits::{DocumentStore, ProjectionSession};
