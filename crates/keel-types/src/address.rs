use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum length of an address in bytes.
pub const MAX_ADDRESS_SIZE: usize = 100;

/// Canonical network-node address.
///
/// The canonical string form is the identity of node-signed signatures:
/// two signatures belong to the same node exactly when their addresses
/// compare equal as strings. Addresses are validated at construction and
/// never hold whitespace or control characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Result<Self, TypeError> {
        let addr = addr.into();
        if addr.is_empty() {
            return Err(TypeError::EmptyAddress);
        }
        if addr.len() > MAX_ADDRESS_SIZE {
            return Err(TypeError::AddressTooLong {
                max: MAX_ADDRESS_SIZE,
                actual: addr.len(),
            });
        }
        if let Some(c) = addr.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidAddressChar(c));
        }
        Ok(Self(addr))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        let addr = Address::new("node0:keel").unwrap();
        assert_eq!(addr.as_str(), "node0:keel");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Address::new("").unwrap_err(), TypeError::EmptyAddress);
    }

    #[test]
    fn rejects_oversized() {
        let long = "n".repeat(MAX_ADDRESS_SIZE + 1);
        assert!(matches!(
            Address::new(long).unwrap_err(),
            TypeError::AddressTooLong { .. }
        ));
    }

    #[test]
    fn rejects_whitespace() {
        assert_eq!(
            Address::new("node 0").unwrap_err(),
            TypeError::InvalidAddressChar(' ')
        );
    }

    #[test]
    fn canonical_form_is_stable() {
        let a = Address::new("node0").unwrap();
        let b = Address::new("node0").unwrap();
        assert_eq!(a, b);
    }
}
