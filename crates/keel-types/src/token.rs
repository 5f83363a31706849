use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum size of a fact token in bytes.
pub const MAX_TOKEN_SIZE: usize = 100;

/// Bounded fact token.
///
/// Every fact carries a token; validation rejects empty and oversized
/// tokens at the envelope boundary.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token(Vec<u8>);

impl Token {
    pub fn new(token: impl Into<Vec<u8>>) -> Self {
        Self(token.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ensure_valid(&self) -> Result<(), TypeError> {
        if self.0.is_empty() {
            return Err(TypeError::EmptyToken);
        }
        if self.0.len() > MAX_TOKEN_SIZE {
            return Err(TypeError::TokenTooLong {
                max: MAX_TOKEN_SIZE,
                actual: self.0.len(),
            });
        }
        Ok(())
    }
}

impl From<&str> for Token {
    fn from(token: &str) -> Self {
        Self(token.as_bytes().to_vec())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", String::from_utf8_lossy(&self.0))
    }
}
