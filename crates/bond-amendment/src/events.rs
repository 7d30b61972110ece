//! Outgoing workflow events
//!
//! Published through [`EventPublisher`](crate::ports::EventPublisher) as the
//! workflow moves. Observability only; no behaviour depends on them.

use crate::domain::{WorkflowCheckpoint, WorkflowStage};
use serde::{Deserialize, Serialize};
use shared_types::{Party, VersionRef};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AmendmentEvent {
    /// Workflow entered `checkpoint.stage`.
    StageChanged {
        from: WorkflowStage,
        checkpoint: WorkflowCheckpoint,
    },
    /// A counterparty endorsement verified and was appended.
    EndorsementCollected { workflow_id: Uuid, signer: Party },
    /// Outstanding sessions were aborted after a rejection or failure.
    SessionsCancelled { workflow_id: Uuid, pending: usize },
    /// Terminal success.
    Committed {
        workflow_id: Uuid,
        version: VersionRef,
    },
    /// Terminal failure.
    Aborted {
        workflow_id: Uuid,
        stage: WorkflowStage,
        reason: String,
    },
}

impl AmendmentEvent {
    pub fn workflow_id(&self) -> Uuid {
        match self {
            AmendmentEvent::StageChanged { checkpoint, .. } => checkpoint.workflow_id,
            AmendmentEvent::EndorsementCollected { workflow_id, .. }
            | AmendmentEvent::SessionsCancelled { workflow_id, .. }
            | AmendmentEvent::Committed { workflow_id, .. }
            | AmendmentEvent::Aborted { workflow_id, .. } => *workflow_id,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            AmendmentEvent::StageChanged { .. } => "stage_changed",
            AmendmentEvent::EndorsementCollected { .. } => "endorsement_collected",
            AmendmentEvent::SessionsCancelled { .. } => "sessions_cancelled",
            AmendmentEvent::Committed { .. } => "committed",
            AmendmentEvent::Aborted { .. } => "aborted",
        }
    }
}
