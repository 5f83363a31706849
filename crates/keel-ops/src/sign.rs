use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keel_crypto::{HashBuilder, PublicKey, Signature, SigningKey};
use keel_types::{Address, ContentHash, NetworkId};

use crate::error::OperationError;

/// A signature whose identity is the signer's public key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserSign {
    pub signer: PublicKey,
    pub signature: Signature,
    pub signed_at: DateTime<Utc>,
}

impl UserSign {
    /// Sign a fact hash under the given network.
    pub fn new(
        key: &SigningKey,
        fact_hash: &ContentHash,
        network: &NetworkId,
    ) -> Result<Self, OperationError> {
        network.ensure_valid()?;
        let signature = key.sign(&user_payload(fact_hash, network));
        Ok(Self {
            signer: key.public_key(),
            signature,
            signed_at: Utc::now(),
        })
    }
}

/// A signature whose identity is a node address.
///
/// The node address is the deduplication identity; the embedded public key
/// is the verification key the node signed with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSign {
    pub node: Address,
    pub signer: PublicKey,
    pub signature: Signature,
    pub signed_at: DateTime<Utc>,
}

impl NodeSign {
    /// Sign a fact hash on behalf of a node under the given network.
    pub fn new(
        node: Address,
        key: &SigningKey,
        fact_hash: &ContentHash,
        network: &NetworkId,
    ) -> Result<Self, OperationError> {
        network.ensure_valid()?;
        let signature = key.sign(&node_payload(&node, fact_hash, network));
        Ok(Self {
            node,
            signer: key.public_key(),
            signature,
            signed_at: Utc::now(),
        })
    }

    /// The canonical identity of this signature.
    pub fn identity(&self) -> &str {
        self.node.as_str()
    }
}

/// Closed union over the two signature kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationSign {
    User(UserSign),
    Node(NodeSign),
}

impl OperationSign {
    /// The canonical identity string: the signer public key in hex for the
    /// user kind, the node address for the node kind.
    pub fn identity(&self) -> String {
        match self {
            Self::User(s) => s.signer.to_hex(),
            Self::Node(s) => s.node.as_str().to_owned(),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node(_))
    }

    pub fn signed_at(&self) -> DateTime<Utc> {
        match self {
            Self::User(s) => s.signed_at,
            Self::Node(s) => s.signed_at,
        }
    }

    /// Cryptographically verify this signature over the fact hash under
    /// the given network.
    pub fn verify(
        &self,
        fact_hash: &ContentHash,
        network: &NetworkId,
    ) -> Result<(), OperationError> {
        network.ensure_valid()?;
        match self {
            Self::User(s) => {
                s.signer
                    .verify(&user_payload(fact_hash, network), &s.signature)?;
            }
            Self::Node(s) => {
                s.signer
                    .verify(&node_payload(&s.node, fact_hash, network), &s.signature)?;
            }
        }
        Ok(())
    }

    /// Fold this signature's canonical bytes into an envelope hash.
    pub(crate) fn hash_into(&self, builder: &mut HashBuilder) {
        match self {
            Self::User(s) => {
                builder.update(b"user");
                builder.update(&s.signer.as_bytes());
                builder.update(&s.signature.to_bytes());
                builder.update(&s.signed_at.timestamp_millis().to_le_bytes());
            }
            Self::Node(s) => {
                builder.update(b"node");
                builder.update(s.node.as_bytes());
                builder.update(&s.signer.as_bytes());
                builder.update(&s.signature.to_bytes());
                builder.update(&s.signed_at.timestamp_millis().to_le_bytes());
            }
        }
    }
}

impl From<NodeSign> for OperationSign {
    fn from(sign: NodeSign) -> Self {
        Self::Node(sign)
    }
}

fn user_payload(fact_hash: &ContentHash, network: &NetworkId) -> Vec<u8> {
    let mut payload = Vec::with_capacity(network.as_bytes().len() + 32);
    payload.extend_from_slice(network.as_bytes());
    payload.extend_from_slice(fact_hash.as_bytes());
    payload
}

fn node_payload(node: &Address, fact_hash: &ContentHash, network: &NetworkId) -> Vec<u8> {
    let mut payload =
        Vec::with_capacity(network.as_bytes().len() + node.as_bytes().len() + 32);
    payload.extend_from_slice(network.as_bytes());
    payload.extend_from_slice(node.as_bytes());
    payload.extend_from_slice(fact_hash.as_bytes());
    payload
}
