//! Cryptographic primitives for the Keel ledger runtime.
//!
//! Two concerns live here:
//!
//! - [`ContentHasher`] — domain-separated BLAKE3 hashing. Every hashed
//!   record kind carries its own domain tag, so a state entry and an
//!   operation envelope with identical bytes can never collide.
//! - [`SigningKey`] / [`PublicKey`] / [`Signature`] — ed25519 signing with
//!   byte-level serde and a canonical hex identity for public keys.

pub mod hasher;
pub mod signer;

pub use hasher::{ContentHasher, HashBuilder};
pub use signer::{PublicKey, Signature, SignatureError, SigningKey};
