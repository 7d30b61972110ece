//! # Bond Node
//!
//! Issues a bond to three in-process parties and runs one bank assessment
//! through the full propose/endorse/commit protocol.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging
//! 2. Load configuration (env over defaults)
//! 3. Start exporter and guarantor responders, bank orchestrator, notary
//! 4. Issue the bond
//! 5. Run the assessment and report the outcome

use std::sync::Arc;

use anyhow::{Context, Result};
use bond_amendment::adapters::TracingEventSink;
use bond_amendment::ports::{AmendmentApi, RecordStore, WorkflowOutcome};
use bond_node::{LocalNetwork, NodeConfig, PartyKeys};
use bond_telemetry::{init_telemetry, render_metrics, TelemetryConfig};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let config = NodeConfig::from_env().context("Invalid node configuration")?;
    info!("===========================================");
    info!("  Bond Amendment Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let network = LocalNetwork::start(&config, PartyKeys::generate(), Arc::new(TracingEventSink));

    let genesis = network
        .issue_bond(&config.bond_id, config.face_value)
        .context("Failed to issue bond")?;
    info!(version = %genesis, face_value = config.face_value, "Bond issued");

    let request = network.bank_request(&config.bond_id, config.update.clone());
    let outcome = network
        .bank
        .begin_transition(request)
        .await
        .context("Amendment workflow hit a fatal store error")?;

    match outcome {
        WorkflowOutcome::Committed(version) => {
            let current = network
                .vault
                .find_current(&config.bond_id)
                .context("Committed bond not readable")?;
            info!(
                version = %version,
                risk_level = current.state.terms.risk_level,
                credit_score = current.state.terms.credit_score,
                supply_contract = ?current.state.terms.bank_supply_contract_id,
                face_value = current.state.face_value,
                "Bank assessment committed"
            );
            let snapshot =
                serde_json::to_string_pretty(&current.state).context("Failed to encode bond")?;
            debug!("current version of {}:\n{}", config.bond_id, snapshot);
        }
        WorkflowOutcome::Aborted { stage, reason } => {
            warn!(%stage, kind = reason.stage_label(), "Bank assessment aborted: {}", reason);
        }
    }

    match render_metrics() {
        Ok(text) if !text.is_empty() => debug!("metrics:\n{}", text),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Failed to render metrics"),
    }

    network.shutdown();
    Ok(())
}
