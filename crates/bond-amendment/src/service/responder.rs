//! Counterparty-side workflow.
//!
//! Trusts nothing from the wire: the proposer's own validation is never
//! consulted, the digest is recomputed locally and every check runs here.

use super::LocalIdentity;
use crate::domain::AcceptancePolicy;
use crate::metrics;
use crate::ports::inbound::ResponderApi;
use crate::ports::outbound::{EndorsementReply, TransitionValidator, ValidationInput};
use shared_types::{Endorsement, Party, SignedProposal};
use std::sync::Arc;
use tracing::{info, info_span, warn};

/// Endorses proposals that pass the shared contract and this party's policy.
pub struct ResponderService<V, P>
where
    V: TransitionValidator,
    P: AcceptancePolicy,
{
    identity: LocalIdentity,
    validator: Arc<V>,
    policy: P,
}

impl<V, P> ResponderService<V, P>
where
    V: TransitionValidator,
    P: AcceptancePolicy,
{
    pub fn new(identity: LocalIdentity, validator: Arc<V>, policy: P) -> Self {
        Self {
            identity,
            validator,
            policy,
        }
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    fn decide(&self, sender: &Party, signed: &SignedProposal) -> Result<Endorsement, String> {
        let proposal = &signed.proposal;

        if sender != &proposal.proposer {
            return Err(format!("{sender} sent a proposal on behalf of {}", proposal.proposer));
        }

        // Shape first, independent of content.
        let Some(input) = proposal.single_input() else {
            return Err("transition must consume exactly one input version".into());
        };
        if proposal.single_output().is_none() {
            return Err("transition must produce exactly one output version".into());
        }

        if input.state.participants.bank != proposal.proposer {
            return Err("proposer is not the bank on this bond".into());
        }
        if !proposal.requires(&self.identity.party().key) {
            return Err("this party is not a required signer".into());
        }

        let digest = proposal.digest().map_err(|e| e.to_string())?;
        let proposer_endorsement = signed
            .endorsement_from(&proposal.proposer.key)
            .ok_or_else(|| "missing proposer endorsement".to_string())?;
        proposer_endorsement
            .verify(&digest)
            .map_err(|e| format!("proposer endorsement invalid: {e}"))?;

        self.validator
            .validate(ValidationInput::from(proposal))
            .map_err(|rejection| rejection.reason)?;
        self.policy.evaluate(proposal)?;

        Ok(self.identity.endorse(digest))
    }
}

impl<V, P> ResponderApi for ResponderService<V, P>
where
    V: TransitionValidator,
    P: AcceptancePolicy,
{
    fn on_proposal(&self, sender: &Party, signed: &SignedProposal) -> EndorsementReply {
        let span = info_span!(
            "endorse",
            workflow_id = %signed.proposal.workflow_id,
            responder = %self.identity.party().name,
        );
        let _entered = span.enter();

        match self.decide(sender, signed) {
            Ok(endorsement) => {
                metrics::record_responder_decision("endorsed");
                info!(proposer = %sender, "[amendment] proposal endorsed");
                EndorsementReply::Endorsed(endorsement)
            }
            Err(reason) => {
                metrics::record_responder_decision("rejected");
                warn!(proposer = %sender, reason = %reason, "[amendment] proposal rejected");
                EndorsementReply::Rejected { reason }
            }
        }
    }
}
