//! Candidate transition construction.

use shared_types::{AmendmentCommand, Party, StateAndRef, TermsUpdate, TransitionProposal};
use uuid::Uuid;

/// Build the bank-assessment proposal consuming `current`.
///
/// The fetched version is left untouched; the output is a fresh value with the
/// same bond id, face value and participants. Required signers are the three
/// participants in role order.
pub fn build_bank_assessment(
    workflow_id: Uuid,
    current: &StateAndRef,
    proposer: &Party,
    update: &TermsUpdate,
) -> TransitionProposal {
    let output = current
        .state
        .with_terms(update.apply_to(&current.state.terms));

    TransitionProposal {
        workflow_id,
        command: AmendmentCommand::BankAssess,
        inputs: vec![current.clone()],
        outputs: vec![output],
        required_signers: current.state.participants.keys().to_vec(),
        proposer: proposer.clone(),
    }
}
