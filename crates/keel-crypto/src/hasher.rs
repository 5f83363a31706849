use keel_types::ContentHash;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so records of different kinds never collide even when
/// their serialized bytes are identical.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for operation envelopes.
    pub const OPERATION: Self = Self {
        domain: "keel-operation-v1",
    };
    /// Hasher for ledger state entries.
    pub const STATE: Self = Self {
        domain: "keel-state-v1",
    };
    /// Hasher for state values.
    pub const VALUE: Self = Self {
        domain: "keel-value-v1",
    };
    /// Hasher for block manifests.
    pub const MANIFEST: Self = Self {
        domain: "keel-manifest-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut builder = self.builder();
        builder.update(data);
        builder.finish()
    }

    /// Start a streaming hash over multiple fields.
    ///
    /// Each field is fed through [`HashBuilder::update`]; absent optional
    /// fields are simply not fed, so they contribute nothing.
    pub fn builder(&self) -> HashBuilder {
        let mut inner = blake3::Hasher::new();
        inner.update(self.domain.as_bytes());
        inner.update(b":");
        HashBuilder { inner }
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Incremental hash over a sequence of fields.
pub struct HashBuilder {
    inner: blake3::Hasher,
}

impl HashBuilder {
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    pub fn finish(self) -> ContentHash {
        ContentHash::from_raw(*self.inner.finalize().as_bytes())
    }
}
