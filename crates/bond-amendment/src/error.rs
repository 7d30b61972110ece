//! Error types for the bond amendment subsystem
//!
//! Every abort carries one of these. The variant names the stage that failed
//! and the payload names the party or rule involved.

use shared_types::{Party, ProposalError, VersionRef};
use thiserror::Error;

/// Amendment workflow errors
#[derive(Debug, Clone, Error)]
pub enum AmendmentError {
    /// No current version exists for the bond
    #[error("Bond {record_id} not found")]
    NotFound { record_id: String },

    /// More than one current version for the same bond. Fatal.
    #[error("Store corruption: {current_count} current versions of bond {record_id}")]
    StoreCorruption {
        record_id: String,
        current_count: usize,
    },

    /// Proposer is not the bank recorded on the bond
    #[error("Unauthorized: {proposer} is not the bank on this bond ({expected})")]
    Unauthorized { proposer: Party, expected: Party },

    /// Structural or business rule violation
    #[error("Validation failed: {reason}")]
    ValidationFailed { reason: String },

    /// A required signer declined
    #[error("Endorsement rejected by {party}: {reason}")]
    EndorsementRejected { party: Party, reason: String },

    /// Timeout or disconnect on an endorsement session
    #[error("Session with {party} failed: {reason}")]
    SessionFailure { party: Party, reason: String },

    /// Counterparty returned an endorsement that does not verify
    #[error("Invalid endorsement from {party}: {reason}")]
    InvalidEndorsement { party: Party, reason: String },

    /// Another transition consumed the input version first
    #[error("Version conflict: {input} was already superseded")]
    VersionConflict { input: VersionRef },

    /// Notary refused the submission or did not answer
    #[error("Sequencing failed: {reason}")]
    SequencingFailure { reason: String },

    /// Canonical encoding failed
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl AmendmentError {
    /// Store corruption must never be recovered from silently.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AmendmentError::StoreCorruption { .. })
    }

    /// Only a lost sequencing race is worth re-running from scratch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AmendmentError::VersionConflict { .. })
    }

    /// Short machine-readable label (used for metrics and logs).
    pub fn stage_label(&self) -> &'static str {
        match self {
            AmendmentError::NotFound { .. } => "not_found",
            AmendmentError::StoreCorruption { .. } => "store_corruption",
            AmendmentError::Unauthorized { .. } => "unauthorized",
            AmendmentError::ValidationFailed { .. } => "validation_failed",
            AmendmentError::EndorsementRejected { .. } => "endorsement_rejected",
            AmendmentError::SessionFailure { .. } => "session_failure",
            AmendmentError::InvalidEndorsement { .. } => "invalid_endorsement",
            AmendmentError::VersionConflict { .. } => "version_conflict",
            AmendmentError::SequencingFailure { .. } => "sequencing_failure",
            AmendmentError::Encoding(_) => "encoding",
        }
    }
}

impl From<ProposalError> for AmendmentError {
    fn from(e: ProposalError) -> Self {
        AmendmentError::Encoding(e.to_string())
    }
}

/// Result type for amendment operations
pub type AmendmentResult<T> = Result<T, AmendmentError>;

/// Record store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no current version of {record_id}")]
    NotFound { record_id: String },

    #[error("{current_count} current versions of {record_id}")]
    Corruption {
        record_id: String,
        current_count: usize,
    },
}

impl From<StoreError> for AmendmentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { record_id } => AmendmentError::NotFound { record_id },
            StoreError::Corruption {
                record_id,
                current_count,
            } => AmendmentError::StoreCorruption {
                record_id,
                current_count,
            },
        }
    }
}

/// Endorsement session errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no reply within {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("counterparty disconnected")]
    Disconnected,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Sequencing (notary) errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencingError {
    /// Submission is not a valid, fully endorsed transition
    #[error("notary rejected transition: {reason}")]
    Rejected { reason: String },

    /// Notary did not answer
    #[error("notary unavailable: {0}")]
    Unavailable(String),
}
