//! # BLAKE3 Digests
//!
//! Proposals are identified by a 256-bit BLAKE3 digest of their canonical
//! encoding. The domain tag and a length prefix are absorbed first so that
//! two message kinds with identical bytes still hash differently.

use blake3::Hasher;

/// BLAKE3 digest output (256-bit).
pub type Digest = [u8; 32];

/// Stateful digest builder bound to a domain tag.
pub struct DigestBuilder {
    inner: Hasher,
}

impl DigestBuilder {
    /// Create a builder for the given domain tag.
    pub fn with_domain(domain: &str) -> Self {
        let mut inner = Hasher::new();
        inner.update(&(domain.len() as u64).to_le_bytes());
        inner.update(domain.as_bytes());
        Self { inner }
    }

    /// Absorb a length-prefixed field.
    pub fn field(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(&(data.len() as u64).to_le_bytes());
        self.inner.update(data);
        self
    }

    /// Finalize and return the digest.
    pub fn finalize(&self) -> Digest {
        *self.inner.finalize().as_bytes()
    }
}

/// One-shot domain-separated digest.
pub fn domain_digest(domain: &str, data: &[u8]) -> Digest {
    DigestBuilder::with_domain(domain).field(data).finalize()
}
