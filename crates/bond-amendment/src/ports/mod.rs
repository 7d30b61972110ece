//! Ports module for the amendment subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::{AmendmentApi, AmendmentRequest, Counterparties, ResponderApi, WorkflowOutcome};
pub use outbound::{
    EndorsementReply, EndorsementSession, EventPublisher, RecordStore, SequencingClient,
    SequencingVerdict, SessionProvider, TransitionValidator, ValidationInput, ValidationRejection,
};
