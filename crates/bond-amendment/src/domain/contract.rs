//! Bond contract: the static rules every bond transition must satisfy.
//!
//! Run by the proposer before any session is opened and again, independently,
//! by every responder.

use crate::ports::outbound::{TransitionValidator, ValidationInput, ValidationRejection};
use shared_types::{AmendmentCommand, Bond, BondTerms};
use std::collections::HashSet;

/// Highest risk level a bank may assign.
pub const MAX_RISK_LEVEL: u8 = 5;
/// Highest credit score a bank may assign.
pub const MAX_CREDIT_SCORE: f64 = 4.0;

/// Validator for the bond state.
#[derive(Debug, Default, Clone, Copy)]
pub struct BondContract;

impl BondContract {
    pub fn new() -> Self {
        Self
    }

    fn verify_bank_assess(
        &self,
        input: &Bond,
        output: &Bond,
        required_signers: &[shared_types::PartyPublicKey],
    ) -> Result<(), ValidationRejection> {
        if output.bond_id != input.bond_id {
            return Err(ValidationRejection::new("bond id must not change"));
        }
        if output.face_value != input.face_value {
            return Err(ValidationRejection::new("face value must not change"));
        }
        if output.participants != input.participants {
            return Err(ValidationRejection::new("participants must not change"));
        }

        let expected: HashSet<_> = input.participants.keys().into_iter().collect();
        let given: HashSet<_> = required_signers.iter().copied().collect();
        if given.len() != required_signers.len() {
            return Err(ValidationRejection::new("duplicate required signer"));
        }
        if given != expected {
            return Err(ValidationRejection::new(
                "required signers must be exactly the exporter, bank and guarantor",
            ));
        }

        check_terms(&output.terms)?;

        if output.terms.guarantor_supply_contract_id != input.terms.guarantor_supply_contract_id
            || output.terms.guarantor_supported != input.terms.guarantor_supported
        {
            return Err(ValidationRejection::new(
                "guarantor fields cannot be changed by a bank assessment",
            ));
        }
        Ok(())
    }
}

fn check_terms(terms: &BondTerms) -> Result<(), ValidationRejection> {
    if terms.risk_level > MAX_RISK_LEVEL {
        return Err(ValidationRejection::new(format!(
            "risk level {} outside 0..={}",
            terms.risk_level, MAX_RISK_LEVEL
        )));
    }
    if !terms.credit_score.is_finite()
        || !(0.0..=MAX_CREDIT_SCORE).contains(&terms.credit_score)
    {
        return Err(ValidationRejection::new(format!(
            "credit score {} outside 0.0..={}",
            terms.credit_score, MAX_CREDIT_SCORE
        )));
    }
    if !terms.exporter_turnover.is_finite() || terms.exporter_turnover < 0.0 {
        return Err(ValidationRejection::new(
            "exporter turnover must be a non-negative amount",
        ));
    }
    if !terms.exporter_net.is_finite() {
        return Err(ValidationRejection::new("exporter net income must be finite"));
    }
    if matches!(terms.bank_supply_contract_id.as_deref(), Some(id) if id.trim().is_empty()) {
        return Err(ValidationRejection::new(
            "bank supply contract id must not be empty",
        ));
    }
    Ok(())
}

impl TransitionValidator for BondContract {
    fn validate(&self, input: ValidationInput<'_>) -> Result<(), ValidationRejection> {
        let (prior, next) = match (input.inputs, input.outputs) {
            ([prior], [next]) => (prior, next),
            ([_], _) => {
                return Err(ValidationRejection::new(
                    "transition must produce exactly one output version",
                ))
            }
            _ => {
                return Err(ValidationRejection::new(
                    "transition must consume exactly one input version",
                ))
            }
        };

        match input.command {
            AmendmentCommand::BankAssess => {
                self.verify_bank_assess(&prior.state, next, input.required_signers)
            }
        }
    }
}
