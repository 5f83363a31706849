use keel_crypto::SignatureError;
use keel_types::TypeError;
use thiserror::Error;

/// Errors produced by envelope signing and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("operation has no signatures")]
    EmptySignatures,

    #[error("duplicate signer identity: {identity}")]
    DuplicateSigner { identity: String },

    #[error("stored content hash does not match recomputation")]
    HashMismatch,

    #[error("signature by {identity} is not node-signed")]
    WrongSignerKind { identity: String },

    #[error("fact hash does not match its generated hash")]
    FactHashMismatch,

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}
