use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque identifier scoping signature validity to one deployment.
///
/// Signatures computed under one network id never verify under another:
/// the id is folded into every signing payload.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(Vec<u8>);

impl NetworkId {
    pub fn new(id: impl Into<Vec<u8>>) -> Self {
        Self(id.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn ensure_valid(&self) -> Result<(), TypeError> {
        if self.0.is_empty() {
            return Err(TypeError::EmptyNetworkId);
        }
        Ok(())
    }
}

impl From<&str> for NetworkId {
    fn from(id: &str) -> Self {
        Self(id.as_bytes().to_vec())
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkId({})", String::from_utf8_lossy(&self.0))
    }
}
