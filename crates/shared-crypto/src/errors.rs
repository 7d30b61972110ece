//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Signature did not verify against the key and message
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Bytes do not encode a valid Ed25519 point
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Hex input could not be decoded into key material
    #[error("Invalid key encoding: {0}")]
    InvalidEncoding(String),
}
