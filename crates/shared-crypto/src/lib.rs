//! # Shared Crypto - Party Keys and Proposal Digests
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Party endorsements over proposals |
//! | `hashing` | BLAKE3 | Domain-separated proposal digests |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **BLAKE3**: Every digest is prefixed with a domain tag, so a digest
//!   produced for one message kind can never be replayed as another

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{domain_digest, Digest, DigestBuilder};
pub use signatures::{PartyKeyPair, PartyPublicKey, PartySignature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
