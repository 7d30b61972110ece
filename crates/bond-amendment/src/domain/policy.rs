//! Party-local acceptance policies.
//!
//! Applied by a responder after the shared contract passes. These encode what
//! one party knows that the others do not, such as its own books.

use shared_types::TransitionProposal;

/// Business checks a responder applies on top of the contract.
pub trait AcceptancePolicy: Send + Sync {
    /// `Err(reason)` to decline.
    fn evaluate(&self, proposal: &TransitionProposal) -> Result<(), String>;
}

/// Endorse whatever passes the contract.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl AcceptancePolicy for AcceptAll {
    fn evaluate(&self, _proposal: &TransitionProposal) -> Result<(), String> {
        Ok(())
    }
}

/// Exporter compares the figures the bank recorded with its own books.
#[derive(Debug, Clone, Copy)]
pub struct ExporterBooksPolicy {
    pub turnover: f64,
    pub net: f64,
}

impl ExporterBooksPolicy {
    const TOLERANCE: f64 = 1e-6;

    pub fn new(turnover: f64, net: f64) -> Self {
        Self { turnover, net }
    }
}

impl AcceptancePolicy for ExporterBooksPolicy {
    fn evaluate(&self, proposal: &TransitionProposal) -> Result<(), String> {
        let Some(output) = proposal.single_output() else {
            return Err("transition must produce exactly one output version".into());
        };
        if (output.terms.exporter_turnover - self.turnover).abs() > Self::TOLERANCE {
            return Err("turnover mismatch".into());
        }
        if (output.terms.exporter_net - self.net).abs() > Self::TOLERANCE {
            return Err("net income mismatch".into());
        }
        Ok(())
    }
}

/// Guarantor refuses bonds assessed above its risk appetite.
#[derive(Debug, Clone, Copy)]
pub struct RiskCeilingPolicy {
    pub max_risk_level: u8,
}

impl RiskCeilingPolicy {
    pub fn new(max_risk_level: u8) -> Self {
        Self { max_risk_level }
    }
}

impl AcceptancePolicy for RiskCeilingPolicy {
    fn evaluate(&self, proposal: &TransitionProposal) -> Result<(), String> {
        let Some(output) = proposal.single_output() else {
            return Err("transition must produce exactly one output version".into());
        };
        if output.terms.risk_level > self.max_risk_level {
            return Err(format!(
                "risk level {} exceeds ceiling {}",
                output.terms.risk_level, self.max_risk_level
            ));
        }
        Ok(())
    }
}
