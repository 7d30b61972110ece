//! Driving Ports (API - Inbound)

use crate::domain::WorkflowStage;
use crate::error::{AmendmentError, AmendmentResult};
use crate::ports::outbound::EndorsementReply;
use async_trait::async_trait;
use shared_types::{Party, SignedProposal, TermsUpdate, VersionRef};

/// The two counterparties a bank assessment must be endorsed by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counterparties {
    pub exporter: Party,
    pub guarantor: Party,
}

/// Request to amend one bond.
#[derive(Clone, Debug)]
pub struct AmendmentRequest {
    /// Business key of the bond.
    pub record_id: String,
    /// Identity asking for the change. Must be the bank on the bond.
    pub proposer: Party,
    pub counterparties: Counterparties,
    pub update: TermsUpdate,
}

/// Terminal result of one workflow run.
#[derive(Clone, Debug)]
pub enum WorkflowOutcome {
    /// New current version.
    Committed(VersionRef),
    /// `stage` is where the workflow was when it gave up.
    Aborted {
        stage: WorkflowStage,
        reason: AmendmentError,
    },
}

impl WorkflowOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, WorkflowOutcome::Committed(_))
    }

    pub fn committed_version(&self) -> Option<&VersionRef> {
        match self {
            WorkflowOutcome::Committed(v) => Some(v),
            WorkflowOutcome::Aborted { .. } => None,
        }
    }

    pub fn abort_reason(&self) -> Option<&AmendmentError> {
        match self {
            WorkflowOutcome::Committed(_) => None,
            WorkflowOutcome::Aborted { reason, .. } => Some(reason),
        }
    }
}

/// Primary amendment API, run by the proposing bank.
#[async_trait]
pub trait AmendmentApi: Send + Sync {
    /// Drive one transition from fetch to commit.
    ///
    /// `Err` is reserved for fatal store corruption. Every other failure is
    /// reported as `Ok(WorkflowOutcome::Aborted { .. })`.
    async fn begin_transition(&self, request: AmendmentRequest)
        -> AmendmentResult<WorkflowOutcome>;
}

/// Entry point for proposals arriving from a proposer.
pub trait ResponderApi: Send + Sync {
    /// Decide whether to endorse. Never drops a proposal without a reply.
    fn on_proposal(&self, sender: &Party, proposal: &SignedProposal) -> EndorsementReply;
}
