//! Domain layer: contract rules, acceptance policies, proposal construction
//! and the workflow stage machine.

pub mod builder;
pub mod contract;
pub mod policy;
pub mod stage;

pub use builder::build_bank_assessment;
pub use contract::{BondContract, MAX_CREDIT_SCORE, MAX_RISK_LEVEL};
pub use policy::{AcceptAll, AcceptancePolicy, ExporterBooksPolicy, RiskCeilingPolicy};
pub use stage::{WorkflowCheckpoint, WorkflowStage};
