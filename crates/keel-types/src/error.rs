use thiserror::Error;

/// Errors produced by type-level validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("hash is zero")]
    ZeroHash,

    #[error("address is empty")]
    EmptyAddress,

    #[error("address exceeds {max} bytes: {actual}")]
    AddressTooLong { max: usize, actual: usize },

    #[error("address contains invalid character {0:?}")]
    InvalidAddressChar(char),

    #[error("network id is empty")]
    EmptyNetworkId,

    #[error("token is empty")]
    EmptyToken,

    #[error("token exceeds {max} bytes: {actual}")]
    TokenTooLong { max: usize, actual: usize },
}
