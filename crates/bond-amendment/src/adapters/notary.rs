//! In-process notary.
//!
//! Sole writer of current/historical status in the shared [`InMemoryVault`].
//! A submission is accepted only when its signer set is the input's three
//! participants, the contract accepts it and every signer has endorsed it.
//! The current check, the consume and the insert happen under one write lock,
//! so of any submissions racing on the same input exactly one commits.

use super::vault::{CommitOutcome, InMemoryVault};
use crate::error::SequencingError;
use crate::ports::outbound::{
    SequencingClient, SequencingVerdict, TransitionValidator, ValidationInput,
};
use async_trait::async_trait;
use shared_types::{Bond, SignedProposal, VersionRef};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct InMemoryNotary {
    vault: Arc<InMemoryVault>,
    validator: Arc<dyn TransitionValidator>,
    commits: AtomicU64,
    conflicts: AtomicU64,
}

impl InMemoryNotary {
    /// Notary over `vault`, verifying every submission with `validator`.
    pub fn new(vault: Arc<InMemoryVault>, validator: Arc<dyn TransitionValidator>) -> Self {
        Self {
            vault,
            validator,
            commits: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
        }
    }

    /// Issue a new bond as its genesis version.
    pub fn issue(&self, bond: Bond) -> Result<VersionRef, SequencingError> {
        let issuance = bond
            .issuance_digest()
            .map_err(|e| SequencingError::Rejected {
                reason: e.to_string(),
            })?;
        let bond_id = bond.bond_id.clone();
        let reference =
            self.vault
                .insert_genesis(bond, issuance)
                .ok_or_else(|| SequencingError::Rejected {
                    reason: format!("bond {bond_id} is already live"),
                })?;
        info!(version = %reference, "[notary] bond issued");
        Ok(reference)
    }

    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }
}

fn rejected(reason: impl Into<String>) -> SequencingError {
    SequencingError::Rejected {
        reason: reason.into(),
    }
}

#[async_trait]
impl SequencingClient for InMemoryNotary {
    async fn submit(&self, signed: SignedProposal) -> Result<SequencingVerdict, SequencingError> {
        let proposal = &signed.proposal;
        let (Some(input), Some(output)) = (proposal.single_input(), proposal.single_output())
        else {
            return Err(rejected("transition must be one input, one output"));
        };
        if output.bond_id != input.reference.record_id {
            return Err(rejected("output belongs to a different bond"));
        }

        // The signer set comes from the proposer; hold it to the bond's owners.
        let owners: HashSet<_> = input.state.participants.keys().into_iter().collect();
        let listed: HashSet<_> = proposal.required_signers.iter().copied().collect();
        if listed.len() != proposal.required_signers.len() || listed != owners {
            warn!(input = %input.reference, "[notary] signer set differs from participants");
            return Err(rejected(
                "required signers must be exactly the participants of the input",
            ));
        }
        self.validator
            .validate(ValidationInput::from(proposal))
            .map_err(|r| rejected(format!("contract rejected transition: {r}")))?;

        if !signed.is_fully_endorsed() {
            return Err(rejected(format!(
                "transition is not fully endorsed ({} missing)",
                signed.missing_signers().len()
            )));
        }
        let transition_id = proposal.digest().map_err(|e| rejected(e.to_string()))?;

        match self.vault.commit(input, output.clone(), transition_id) {
            CommitOutcome::Committed(version) => {
                self.commits.fetch_add(1, Ordering::Relaxed);
                debug!(input = %input.reference, output = %version, "[notary] committed");
                Ok(SequencingVerdict::Committed(version))
            }
            CommitOutcome::Superseded(consumed_by) => {
                self.conflicts.fetch_add(1, Ordering::Relaxed);
                warn!(input = %input.reference, "[notary] input already consumed");
                Ok(SequencingVerdict::Conflict { consumed_by })
            }
            CommitOutcome::UnknownInput => Err(rejected(format!(
                "unknown input version {}",
                input.reference
            ))),
            CommitOutcome::InputMismatch => Err(rejected(
                "input state does not match the recorded version",
            )),
        }
    }
}
