use keel_types::{ContentHash, Token};

/// The immutable payload an operation attests to.
///
/// A fact exposes its content hash and a bounded token. Facts that can
/// regenerate their own hash from their fields return it from
/// [`Fact::generate_hash`]; envelope validation then checks the declared
/// hash against the freshly generated one.
pub trait Fact: Send + Sync {
    /// The fact's declared content hash.
    fn hash(&self) -> &ContentHash;

    /// The fact's token.
    fn token(&self) -> &Token;

    /// Regenerate the content hash from the fact's fields, if the fact
    /// supports it.
    fn generate_hash(&self) -> Option<ContentHash> {
        None
    }
}
