//! # Amendment Metrics
//!
//! Prometheus metrics for the amendment workflow.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! bond-amendment = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `amendment_workflows_started_total` - Counter of workflows started
//! - `amendment_workflows_committed_total` - Counter of committed transitions
//! - `amendment_workflows_aborted_total` - Counter of aborted workflows (by reason)
//! - `amendment_endorsement_latency_seconds` - Histogram of counterparty reply latency
//! - `amendment_responder_decisions_total` - Counter of responder decisions (by outcome)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total workflows started
    pub static ref WORKFLOWS_STARTED: IntCounter = register_int_counter!(
        "amendment_workflows_started_total",
        "Total number of amendment workflows started"
    )
    .expect("Failed to create WORKFLOWS_STARTED metric");

    /// Total workflows that committed a new version
    pub static ref WORKFLOWS_COMMITTED: IntCounter = register_int_counter!(
        "amendment_workflows_committed_total",
        "Total number of amendment workflows committed"
    )
    .expect("Failed to create WORKFLOWS_COMMITTED metric");

    /// Total workflows aborted, labeled by reason
    pub static ref WORKFLOWS_ABORTED: IntCounterVec = register_int_counter_vec!(
        "amendment_workflows_aborted_total",
        "Total number of amendment workflows aborted",
        &["reason"]
    )
    .expect("Failed to create WORKFLOWS_ABORTED metric");

    /// Counterparty endorsement reply latency
    pub static ref ENDORSEMENT_LATENCY: Histogram = register_histogram!(
        "amendment_endorsement_latency_seconds",
        "Latency between sending a proposal and receiving the counterparty reply",
        vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    )
    .expect("Failed to create ENDORSEMENT_LATENCY metric");

    /// Responder decisions, labeled by outcome
    pub static ref RESPONDER_DECISIONS: IntCounterVec = register_int_counter_vec!(
        "amendment_responder_decisions_total",
        "Total number of proposals endorsed or rejected by this node",
        &["outcome"]
    )
    .expect("Failed to create RESPONDER_DECISIONS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a workflow start
#[cfg(feature = "metrics")]
pub fn record_workflow_started() {
    WORKFLOWS_STARTED.inc();
}

/// Record a committed workflow
#[cfg(feature = "metrics")]
pub fn record_workflow_committed() {
    WORKFLOWS_COMMITTED.inc();
}

/// Record an aborted workflow with reason
#[cfg(feature = "metrics")]
pub fn record_workflow_aborted(reason: &str) {
    WORKFLOWS_ABORTED.with_label_values(&[reason]).inc();
}

/// Record one counterparty reply latency
#[cfg(feature = "metrics")]
pub fn observe_endorsement_latency(seconds: f64) {
    ENDORSEMENT_LATENCY.observe(seconds);
}

/// Record a responder decision ("endorsed" or "rejected")
#[cfg(feature = "metrics")]
pub fn record_responder_decision(outcome: &str) {
    RESPONDER_DECISIONS.with_label_values(&[outcome]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_workflow_started() {}

#[cfg(not(feature = "metrics"))]
pub fn record_workflow_committed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_workflow_aborted(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn observe_endorsement_latency(_seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_responder_decision(_outcome: &str) {}
