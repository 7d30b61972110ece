//! # Transition Proposals and Endorsements
//!
//! A proposal names the bond version it consumes, the version it produces and
//! the keys that must endorse it. Endorsements are Ed25519 signatures over
//! the proposal digest, so an endorsement is only valid for the exact bytes
//! the signer saw.
//!
//! ```text
//! TransitionProposal ──digest()──→ [u8; 32] ──sign──→ Endorsement
//!         │                                               │
//!         └──────────────── SignedProposal ←──────────────┘
//! ```

use crate::entities::{Bond, Party, StateAndRef};
use crate::errors::ProposalError;
use serde::{Deserialize, Serialize};
use shared_crypto::{Digest, DigestBuilder, PartyKeyPair, PartyPublicKey, PartySignature};
use std::collections::HashSet;
use uuid::Uuid;

/// Domain tag for proposal digests.
pub const PROPOSAL_DOMAIN: &str = "bond-amendment/proposal/v1";

/// The business command a transition carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmendmentCommand {
    /// The bank records its assessment of the exporter.
    BankAssess,
}

/// A candidate transition awaiting endorsement.
///
/// `inputs` and `outputs` are vectors on the wire so that receivers can
/// reject anything that is not exactly one-in, one-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionProposal {
    /// Identifier of the workflow that built this proposal.
    pub workflow_id: Uuid,
    pub command: AmendmentCommand,
    pub inputs: Vec<StateAndRef>,
    pub outputs: Vec<Bond>,
    pub required_signers: Vec<PartyPublicKey>,
    pub proposer: Party,
}

impl TransitionProposal {
    /// Canonical encoding used for hashing.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ProposalError> {
        Ok(bincode::serialize(self)?)
    }

    /// Digest every endorsement is bound to.
    pub fn digest(&self) -> Result<Digest, ProposalError> {
        let bytes = self.canonical_bytes()?;
        Ok(DigestBuilder::with_domain(PROPOSAL_DOMAIN)
            .field(&bytes)
            .finalize())
    }

    /// The single input, if the proposal has exactly one.
    pub fn single_input(&self) -> Option<&StateAndRef> {
        match self.inputs.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// The single output, if the proposal has exactly one.
    pub fn single_output(&self) -> Option<&Bond> {
        match self.outputs.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn requires(&self, key: &PartyPublicKey) -> bool {
        self.required_signers.contains(key)
    }
}

/// A required party's signature over a specific proposal digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    pub signer: PartyPublicKey,
    pub proposal_digest: Digest,
    pub signature: PartySignature,
}

impl Endorsement {
    /// Sign `digest` with `keypair`.
    pub fn sign(keypair: &PartyKeyPair, digest: Digest) -> Self {
        Self {
            signer: keypair.public_key(),
            proposal_digest: digest,
            signature: keypair.sign(&digest),
        }
    }

    /// Check this endorsement is bound to `digest` and signed by `signer`.
    pub fn verify(&self, digest: &Digest) -> Result<(), ProposalError> {
        if &self.proposal_digest != digest {
            return Err(ProposalError::DigestMismatch {
                signer: self.signer,
            });
        }
        self.signer
            .verify(digest, &self.signature)
            .map_err(|_| ProposalError::InvalidSignature {
                signer: self.signer,
            })
    }
}

/// A proposal plus the endorsements collected so far. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedProposal {
    pub proposal: TransitionProposal,
    pub endorsements: Vec<Endorsement>,
}

impl SignedProposal {
    pub fn new(proposal: TransitionProposal) -> Self {
        Self {
            proposal,
            endorsements: Vec::new(),
        }
    }

    /// Append an endorsement. A second endorsement from the same signer is refused.
    pub fn add_endorsement(&mut self, endorsement: Endorsement) -> Result<(), ProposalError> {
        if self.endorsed_by(&endorsement.signer) {
            return Err(ProposalError::DuplicateEndorsement {
                signer: endorsement.signer,
            });
        }
        self.endorsements.push(endorsement);
        Ok(())
    }

    pub fn endorsed_by(&self, key: &PartyPublicKey) -> bool {
        self.endorsements.iter().any(|e| &e.signer == key)
    }

    pub fn endorsement_from(&self, key: &PartyPublicKey) -> Option<&Endorsement> {
        self.endorsements.iter().find(|e| &e.signer == key)
    }

    /// Required signers that have not endorsed yet.
    pub fn missing_signers(&self) -> Vec<PartyPublicKey> {
        self.proposal
            .required_signers
            .iter()
            .filter(|k| !self.endorsed_by(k))
            .copied()
            .collect()
    }

    /// Exactly one valid endorsement per required signer and none from anyone else.
    pub fn is_fully_endorsed(&self) -> bool {
        let Ok(digest) = self.proposal.digest() else {
            return false;
        };
        let required: HashSet<_> = self.proposal.required_signers.iter().collect();
        let mut seen = HashSet::new();

        for endorsement in &self.endorsements {
            if !required.contains(&endorsement.signer) || !seen.insert(endorsement.signer) {
                return false;
            }
            if endorsement.verify(&digest).is_err() {
                return false;
            }
        }
        seen.len() == required.len()
    }
}
