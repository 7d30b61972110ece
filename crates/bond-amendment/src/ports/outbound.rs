//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The orchestrator reaches the outside world only through these traits:
//! the record store, the transition validator, counterparty sessions, the
//! notary and the event sink.

use crate::error::{SequencingError, SessionError, StoreError};
use crate::events::AmendmentEvent;
use async_trait::async_trait;
use shared_types::{
    AmendmentCommand, Bond, Endorsement, Party, PartyPublicKey, SignedProposal, StateAndRef,
    TransitionProposal, VersionRef,
};
use std::fmt;

/// Read side of the authoritative version history.
///
/// Implementations must be side-effect free. Only the notary changes which
/// version is current.
pub trait RecordStore: Send + Sync {
    /// The unique current version of `record_id`.
    ///
    /// Zero matches is `NotFound`; more than one is `Corruption`, never a pick.
    fn find_current(&self, record_id: &str) -> Result<StateAndRef, StoreError>;
}

/// Everything a validator looks at, borrowed from the proposal.
#[derive(Clone, Copy, Debug)]
pub struct ValidationInput<'a> {
    pub command: AmendmentCommand,
    pub inputs: &'a [StateAndRef],
    pub outputs: &'a [Bond],
    pub required_signers: &'a [PartyPublicKey],
}

impl<'a> From<&'a TransitionProposal> for ValidationInput<'a> {
    fn from(proposal: &'a TransitionProposal) -> Self {
        Self {
            command: proposal.command,
            inputs: &proposal.inputs,
            outputs: &proposal.outputs,
            required_signers: &proposal.required_signers,
        }
    }
}

/// Why a validator refused a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationRejection {
    pub reason: String,
}

impl ValidationRejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Pure predicate over a candidate transition. Shared by proposer and responders.
pub trait TransitionValidator: Send + Sync {
    fn validate(&self, input: ValidationInput<'_>) -> Result<(), ValidationRejection>;
}

/// A counterparty's answer to a proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndorsementReply {
    Endorsed(Endorsement),
    Rejected { reason: String },
}

/// One point-to-point exchange with a single counterparty.
#[async_trait]
pub trait EndorsementSession: Send {
    /// The party at the other end.
    fn counterparty(&self) -> &Party;

    /// Send the proposal and wait for the reply.
    async fn request_endorsement(
        &mut self,
        proposal: SignedProposal,
    ) -> Result<EndorsementReply, SessionError>;
}

/// Opens sessions towards counterparties.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open_session(
        &self,
        counterparty: &Party,
    ) -> Result<Box<dyn EndorsementSession>, SessionError>;
}

/// The notary's verdict on a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequencingVerdict {
    /// The output is now the current version.
    Committed(VersionRef),
    /// The input was already superseded. `consumed_by` names the winner when known.
    Conflict { consumed_by: Option<VersionRef> },
}

/// Sole writer of "current" status.
///
/// Across concurrent submissions against the same input version at most one
/// returns `Committed`; every other one observes `Conflict`.
#[async_trait]
pub trait SequencingClient: Send + Sync {
    async fn submit(&self, proposal: SignedProposal) -> Result<SequencingVerdict, SequencingError>;
}

/// Sink for workflow events. Returns the number of receivers reached.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: AmendmentEvent) -> usize;
}
