//! Versioned key-value ledger state for the Keel ledger runtime.
//!
//! A [`StateEntry`] is an immutable, height-stamped `(key, value)` record
//! chained to its predecessor by content hash and tagged with the set of
//! operations that produced it. Entries are produced by a [`StateMerger`],
//! a pooled accumulator that combines concurrent contributions for one key
//! within one height into a single transition.
//!
//! The merge protocol is conflict-free: whatever order contributors call
//! [`StateMerger::merge`] / [`StateMerger::add_operation`] in, the closed
//! entry carries the same sorted, deduplicated operation-hash list and
//! therefore the same content hash.

pub mod entry;
pub mod error;
pub mod merger;
pub mod value;

pub use entry::StateEntry;
pub use error::StateError;
pub use merger::{MergerPool, PooledMerger, StateMerger};
pub use value::StateValue;
