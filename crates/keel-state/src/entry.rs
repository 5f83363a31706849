use serde::{Deserialize, Serialize};

use keel_crypto::ContentHasher;
use keel_types::{ContentHash, Height};

use crate::error::StateError;
use crate::value::StateValue;

/// An immutable, height-stamped `(key, value)` ledger record.
///
/// Entries chain to their predecessor by hash reference only; there is no
/// back-pointer to the live predecessor object. The content hash covers
/// the previous hash (when present), the key, the value hash (when
/// present), and the contributing operation hashes in their stored order.
/// Absent optional fields contribute nothing to the hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    height: Height,
    key: String,
    value: Option<StateValue>,
    previous: Option<ContentHash>,
    operations: Vec<ContentHash>,
    hash: ContentHash,
}

impl StateEntry {
    /// Construct an entry, computing its content hash.
    ///
    /// The operation-hash list is hashed in the order given; callers that
    /// need the canonical order go through `StateMerger::close_value`,
    /// which sorts before constructing.
    pub fn new(
        height: Height,
        key: impl Into<String>,
        value: Option<StateValue>,
        previous: Option<ContentHash>,
        operations: Vec<ContentHash>,
    ) -> Self {
        let key = key.into();
        let hash = Self::compute_hash(&key, value.as_ref(), previous.as_ref(), &operations);
        Self {
            height,
            key,
            value,
            previous,
            operations,
            hash,
        }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&StateValue> {
        self.value.as_ref()
    }

    /// Hash of the predecessor entry, if any.
    pub fn previous(&self) -> Option<&ContentHash> {
        self.previous.as_ref()
    }

    /// Hashes of the operations that produced this entry.
    pub fn operations(&self) -> &[ContentHash] {
        &self.operations
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Check structural validity: non-empty key, valid hash-bearing
    /// fields, and a stored hash equal to recomputation.
    pub fn is_valid(&self) -> Result<(), StateError> {
        if self.key.is_empty() {
            return Err(StateError::EmptyKey);
        }
        if let Some(previous) = &self.previous {
            previous.ensure_valid()?;
        }
        for operation in &self.operations {
            operation.ensure_valid()?;
        }
        let recomputed = Self::compute_hash(
            &self.key,
            self.value.as_ref(),
            self.previous.as_ref(),
            &self.operations,
        );
        if self.hash != recomputed {
            return Err(StateError::HashMismatch);
        }
        Ok(())
    }

    fn compute_hash(
        key: &str,
        value: Option<&StateValue>,
        previous: Option<&ContentHash>,
        operations: &[ContentHash],
    ) -> ContentHash {
        let mut builder = ContentHasher::STATE.builder();
        if let Some(previous) = previous {
            builder.update(previous.as_bytes());
        }
        builder.update(key.as_bytes());
        if let Some(value) = value {
            builder.update(value.hash().as_bytes());
        }
        for operation in operations {
            builder.update(operation.as_bytes());
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(n: i64) -> StateValue {
        StateValue::new(json!({"amount": n})).unwrap()
    }

    fn op(seed: u8) -> ContentHash {
        ContentHash::digest(&[seed])
    }

    #[test]
    fn construction_computes_hash() {
        let entry = StateEntry::new(Height::new(3), "acc:alice", Some(value(10)), None, vec![op(1)]);
        entry.is_valid().unwrap();
        assert!(!entry.hash().is_zero());
    }

    #[test]
    fn same_inputs_same_hash() {
        let a = StateEntry::new(Height::new(3), "k", Some(value(10)), None, vec![op(1), op(2)]);
        let b = StateEntry::new(Height::new(3), "k", Some(value(10)), None, vec![op(1), op(2)]);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn operation_order_changes_hash() {
        let a = StateEntry::new(Height::new(3), "k", Some(value(10)), None, vec![op(1), op(2)]);
        let b = StateEntry::new(Height::new(3), "k", Some(value(10)), None, vec![op(2), op(1)]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn absent_value_contributes_nothing() {
        let with_none = StateEntry::new(Height::new(1), "k", None, None, vec![op(1)]);
        let with_some = StateEntry::new(Height::new(1), "k", Some(value(0)), None, vec![op(1)]);
        assert_ne!(with_none.hash(), with_some.hash());
        with_none.is_valid().unwrap();
    }

    #[test]
    fn previous_hash_changes_hash() {
        let genesis = StateEntry::new(Height::new(1), "k", Some(value(1)), None, vec![op(1)]);
        let chained = StateEntry::new(
            Height::new(2),
            "k",
            Some(value(1)),
            Some(*genesis.hash()),
            vec![op(1)],
        );
        assert_ne!(genesis.hash(), chained.hash());
        assert_eq!(chained.previous(), Some(genesis.hash()));
    }

    #[test]
    fn empty_key_is_invalid() {
        let entry = StateEntry::new(Height::new(1), "", Some(value(1)), None, vec![op(1)]);
        assert_eq!(entry.is_valid().unwrap_err(), StateError::EmptyKey);
    }

    #[test]
    fn zero_previous_hash_is_invalid() {
        let entry = StateEntry::new(
            Height::new(1),
            "k",
            Some(value(1)),
            Some(ContentHash::zero()),
            vec![op(1)],
        );
        assert!(matches!(
            entry.is_valid().unwrap_err(),
            StateError::Type(_)
        ));
    }

    #[test]
    fn serde_roundtrip_stays_valid() {
        let entry = StateEntry::new(Height::new(5), "k", Some(value(7)), None, vec![op(3)]);
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: StateEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, parsed);
        parsed.is_valid().unwrap();
    }
}
