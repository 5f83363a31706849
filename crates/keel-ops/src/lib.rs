//! Operation envelope model for the Keel ledger runtime.
//!
//! An operation wraps a [`Fact`], the immutable payload being attested
//! to, in an envelope carrying a signer-deduplicated set of signatures
//! and a cached content hash over `(fact hash, signatures)`.
//!
//! Two envelope variants exist:
//!
//! - [`Operation`] — user-signed; a signature's identity is the signer's
//!   public key.
//! - [`NodeOperation`] — node-signed; a signature's identity is the node
//!   address, and validation rejects any non-node signature.
//!
//! Signing with an identity already present replaces that record in place;
//! the envelope hash is recomputed after every signing mutation. No
//! transition ever removes a signature.

pub mod envelope;
pub mod error;
pub mod fact;
pub mod sign;

pub use envelope::{NodeOperation, Operation};
pub use error::OperationError;
pub use fact::Fact;
pub use sign::{NodeSign, OperationSign, UserSign};
