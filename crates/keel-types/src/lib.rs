//! Foundation types for the Keel ledger runtime.
//!
//! This crate provides the identity and value types shared by every other
//! Keel crate. Every type validates its own structural invariants; higher
//! layers compose these checks into envelope and state validation.
//!
//! # Key Types
//!
//! - [`ContentHash`] — BLAKE3 content hash identifying facts, operations,
//!   state entries, and block manifests
//! - [`Height`] — block height, the unit of ledger progress
//! - [`Address`] — canonical network-node address
//! - [`NetworkId`] — opaque identifier scoping signature validity to one
//!   deployment
//! - [`Token`] — bounded fact token

pub mod address;
pub mod error;
pub mod hash;
pub mod height;
pub mod network;
pub mod token;

pub use address::Address;
pub use error::TypeError;
pub use hash::ContentHash;
pub use height::Height;
pub use network::NetworkId;
pub use token::{Token, MAX_TOKEN_SIZE};
