//! # Error Types
//!
//! Errors raised while encoding proposals or checking endorsements.

use shared_crypto::PartyPublicKey;
use thiserror::Error;

/// Errors produced by the wire model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalError {
    /// Canonical encoding failed.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Endorsement is bound to a different proposal.
    #[error("Endorsement from {signer} is bound to a different proposal")]
    DigestMismatch { signer: PartyPublicKey },

    /// Endorsement signature does not verify.
    #[error("Invalid endorsement signature from {signer}")]
    InvalidSignature { signer: PartyPublicKey },

    /// The same signer endorsed twice.
    #[error("Duplicate endorsement from {signer}")]
    DuplicateEndorsement { signer: PartyPublicKey },
}

impl From<bincode::Error> for ProposalError {
    fn from(e: bincode::Error) -> Self {
        ProposalError::Encoding(e.to_string())
    }
}
