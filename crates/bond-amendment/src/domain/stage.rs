//! Workflow stages
//!
//! State Machine:
//! ```text
//! [PREPARING] ──→ [VALIDATED_LOCALLY] ──→ [COLLECTING_ENDORSEMENTS] ──→ [SEQUENCING] ──→ [COMMITTED]
//!      │                  │                          │                        │
//!      └──────────────────┴──────────────────────────┴────────────────────────┴──→ [ABORTED]
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{Endorsement, Hash};
use std::fmt;
use uuid::Uuid;

/// Stage of one amendment workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowStage {
    Preparing,
    ValidatedLocally,
    CollectingEndorsements,
    Sequencing,
    Committed,
    Aborted,
}

impl WorkflowStage {
    pub fn can_transition_to(self, target: WorkflowStage) -> bool {
        use WorkflowStage::*;
        if target == Aborted {
            return !self.is_terminal();
        }
        matches!(
            (self, target),
            (Preparing, ValidatedLocally)
                | (ValidatedLocally, CollectingEndorsements)
                | (CollectingEndorsements, Sequencing)
                | (Sequencing, Committed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStage::Committed | WorkflowStage::Aborted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::Preparing => "preparing",
            WorkflowStage::ValidatedLocally => "validated_locally",
            WorkflowStage::CollectingEndorsements => "collecting_endorsements",
            WorkflowStage::Sequencing => "sequencing",
            WorkflowStage::Committed => "committed",
            WorkflowStage::Aborted => "aborted",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal resumption state of a workflow: where it is and what it holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowCheckpoint {
    pub workflow_id: Uuid,
    pub record_id: String,
    pub stage: WorkflowStage,
    /// Set once the proposal has been built.
    pub proposal_digest: Option<Hash>,
    pub endorsements: Vec<Endorsement>,
}

impl WorkflowCheckpoint {
    pub fn new(workflow_id: Uuid, record_id: impl Into<String>) -> Self {
        Self {
            workflow_id,
            record_id: record_id.into(),
            stage: WorkflowStage::Preparing,
            proposal_digest: None,
            endorsements: Vec::new(),
        }
    }
}
