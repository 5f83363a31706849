use std::collections::HashSet;

use keel_crypto::{ContentHasher, SigningKey};
use keel_types::{Address, ContentHash, NetworkId};

use crate::error::OperationError;
use crate::fact::Fact;
use crate::sign::{NodeSign, OperationSign, UserSign};

/// A fact wrapped with a signer-deduplicated signature set and a cached
/// content hash.
///
/// The content hash covers the fact hash and every signature record; it is
/// recomputed after every signing mutation. Within one envelope no two
/// signatures share an identity: signing with an identity already present
/// replaces that record in place.
#[derive(Clone, Debug)]
pub struct Operation<F> {
    fact: F,
    hash: ContentHash,
    signs: Vec<OperationSign>,
}

impl<F: Fact> Operation<F> {
    /// Wrap a fact in an unsigned envelope.
    pub fn new(fact: F) -> Self {
        let mut op = Self {
            fact,
            hash: ContentHash::zero(),
            signs: Vec::new(),
        };
        op.hash = op.compute_hash();
        op
    }

    pub fn fact(&self) -> &F {
        &self.fact
    }

    /// The cached content hash over `(fact hash, signatures)`.
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn signs(&self) -> &[OperationSign] {
        &self.signs
    }

    /// Sign the fact with a user key.
    ///
    /// If a signature with this key's identity already exists it is
    /// replaced in place; otherwise the new record is appended. The
    /// envelope hash is recomputed unconditionally.
    pub fn sign(&mut self, key: &SigningKey, network: &NetworkId) -> Result<(), OperationError> {
        let record = UserSign::new(key, self.fact.hash(), network)?;
        self.put_sign(OperationSign::User(record));
        self.hash = self.compute_hash();
        Ok(())
    }

    /// Sign the fact on behalf of a node, with the same replace-or-append
    /// semantics as [`Operation::sign`].
    pub fn node_sign(
        &mut self,
        node: Address,
        key: &SigningKey,
        network: &NetworkId,
    ) -> Result<(), OperationError> {
        let record = NodeSign::new(node, key, self.fact.hash(), network)?;
        self.put_sign(OperationSign::Node(record));
        self.hash = self.compute_hash();
        Ok(())
    }

    /// Validate the envelope: a non-empty, identity-distinct signature set
    /// whose every record verifies under the network, a content hash that
    /// matches recomputation, and a structurally valid fact.
    pub fn validate(&self, network: &NetworkId) -> Result<(), OperationError> {
        if self.signs.is_empty() {
            return Err(OperationError::EmptySignatures);
        }

        let mut identities = HashSet::with_capacity(self.signs.len());
        for sign in &self.signs {
            let identity = sign.identity();
            if !identities.insert(identity.clone()) {
                return Err(OperationError::DuplicateSigner { identity });
            }
            sign.verify(self.fact.hash(), network)?;
        }

        if self.hash != self.compute_hash() {
            return Err(OperationError::HashMismatch);
        }

        self.validate_fact()
    }

    /// Recompute the content hash from the current fact and signatures.
    pub fn compute_hash(&self) -> ContentHash {
        let mut builder = ContentHasher::OPERATION.builder();
        builder.update(self.fact.hash().as_bytes());
        for sign in &self.signs {
            sign.hash_into(&mut builder);
        }
        builder.finish()
    }

    fn validate_fact(&self) -> Result<(), OperationError> {
        self.fact.token().ensure_valid()?;
        if let Some(generated) = self.fact.generate_hash() {
            if generated != *self.fact.hash() {
                return Err(OperationError::FactHashMismatch);
            }
        }
        Ok(())
    }

    fn put_sign(&mut self, record: OperationSign) {
        let identity = record.identity();
        match self.signs.iter().position(|s| s.identity() == identity) {
            Some(pos) => self.signs[pos] = record,
            None => self.signs.push(record),
        }
    }
}

/// An operation whose signatures must all be node-signed.
///
/// Node operations circulate between network nodes; a signature's identity
/// is the node address. Validation rejects envelopes holding any user-kind
/// signature.
#[derive(Clone, Debug)]
pub struct NodeOperation<F> {
    inner: Operation<F>,
}

impl<F: Fact> NodeOperation<F> {
    /// Wrap a fact in an unsigned node envelope.
    pub fn new(fact: F) -> Self {
        Self {
            inner: Operation::new(fact),
        }
    }

    pub fn fact(&self) -> &F {
        self.inner.fact()
    }

    pub fn hash(&self) -> &ContentHash {
        self.inner.hash()
    }

    pub fn signs(&self) -> &[OperationSign] {
        self.inner.signs()
    }

    /// Sign on behalf of a node, replacing any record with the same node
    /// identity.
    pub fn sign(
        &mut self,
        node: Address,
        key: &SigningKey,
        network: &NetworkId,
    ) -> Result<(), OperationError> {
        self.inner.node_sign(node, key, network)
    }

    /// Validate as [`Operation::validate`], additionally requiring every
    /// signature to be node-kind.
    pub fn validate(&self, network: &NetworkId) -> Result<(), OperationError> {
        for sign in self.inner.signs() {
            if !sign.is_node() {
                return Err(OperationError::WrongSignerKind {
                    identity: sign.identity(),
                });
            }
        }
        self.inner.validate(network)
    }

    /// Merge node signatures whose identities are absent from the
    /// envelope; records already present are left untouched.
    ///
    /// The incoming batch must not contain duplicate node identities. The
    /// envelope hash is recomputed only if at least one record was added.
    /// Returns whether any change occurred.
    pub fn add_node_signs(&mut self, signs: Vec<NodeSign>) -> Result<bool, OperationError> {
        ensure_distinct(&signs)?;

        let mut added = false;
        for sign in signs {
            let present = self
                .inner
                .signs
                .iter()
                .any(|s| s.identity() == sign.identity());
            if !present {
                self.inner.signs.push(OperationSign::Node(sign));
                added = true;
            }
        }

        if added {
            self.inner.hash = self.inner.compute_hash();
        }
        Ok(added)
    }

    /// Replace the signature set wholesale.
    ///
    /// The incoming batch must not contain duplicate node identities.
    pub fn set_node_signs(&mut self, signs: Vec<NodeSign>) -> Result<(), OperationError> {
        ensure_distinct(&signs)?;

        self.inner.signs = signs.into_iter().map(OperationSign::Node).collect();
        self.inner.hash = self.inner.compute_hash();
        Ok(())
    }
}

fn ensure_distinct(signs: &[NodeSign]) -> Result<(), OperationError> {
    let mut identities = HashSet::with_capacity(signs.len());
    for sign in signs {
        if !identities.insert(sign.identity()) {
            return Err(OperationError::DuplicateSigner {
                identity: sign.identity().to_owned(),
            });
        }
    }
    Ok(())
}
