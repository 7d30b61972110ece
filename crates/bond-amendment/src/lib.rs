//! # bond-amendment
//!
//! Multi-party amendment protocol for a bond jointly owned by an exporter, a
//! bank and a guarantee agency.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Orchestrator**: the bank's propose/endorse/commit workflow
//! - **Responder**: each counterparty's independent endorse-or-reject decision
//! - **Bond contract**: the static rules both sides validate against
//! - **Notary**: single-winner sequencing of transitions per input version
//!
//! ## Architecture
//!
//! ```text
//! Bank ──AmendmentRequest──→ AmendmentService
//!                                 │
//!                                 ├── find_current ──→ RecordStore
//!                                 ├── validate ──→ TransitionValidator
//!                                 ├── SignedProposal ──→ Exporter  (ResponderService)
//!                                 ├── SignedProposal ──→ Guarantor (ResponderService)
//!                                 └── submit ──→ SequencingClient ──→ Committed | Conflict
//! ```
//!
//! ## Workflow Stages
//!
//! ```text
//! [PREPARING] → [VALIDATED_LOCALLY] → [COLLECTING_ENDORSEMENTS] → [SEQUENCING] → [COMMITTED]
//!       └──────────────┴──────────────────────┴────────────────────────┴──────→ [ABORTED]
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use bond_amendment::{AmendmentService, AmendmentConfig, AmendmentRequest};
//! use bond_amendment::ports::inbound::AmendmentApi;
//!
//! let service = AmendmentService::new(
//!     AmendmentConfig::default(),
//!     bank_identity,
//!     vault,
//!     Arc::new(BondContract::new()),
//!     sessions,
//!     notary,
//!     events,
//! );
//!
//! match service.begin_transition(request).await? {
//!     WorkflowOutcome::Committed(version) => println!("now at {version}"),
//!     WorkflowOutcome::Aborted { stage, reason } => println!("{stage}: {reason}"),
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use config::AmendmentConfig;
pub use domain::{
    AcceptAll, AcceptancePolicy, BondContract, ExporterBooksPolicy, RiskCeilingPolicy,
    WorkflowCheckpoint, WorkflowStage,
};
pub use error::{AmendmentError, AmendmentResult, SequencingError, SessionError, StoreError};
pub use events::AmendmentEvent;
pub use ports::{
    AmendmentApi, AmendmentRequest, Counterparties, ResponderApi, WorkflowOutcome,
};
pub use service::{AmendmentService, LocalIdentity, ResponderService};
