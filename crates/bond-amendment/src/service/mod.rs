//! Amendment services
//!
//! - [`AmendmentService`]: the proposer side, driving one transition per call.
//! - [`ResponderService`]: the counterparty side, endorsing or rejecting.

mod orchestrator;
mod responder;

#[cfg(test)]
mod tests;

pub use orchestrator::AmendmentService;
pub use responder::ResponderService;

use shared_crypto::PartyKeyPair;
use shared_types::{Endorsement, Hash, Party};
use std::sync::Arc;

/// The node's own party and signing key, passed explicitly to each service.
#[derive(Clone, Debug)]
pub struct LocalIdentity {
    party: Party,
    keypair: Arc<PartyKeyPair>,
}

impl LocalIdentity {
    pub fn new(name: impl Into<String>, keypair: PartyKeyPair) -> Self {
        Self {
            party: Party::new(name, keypair.public_key()),
            keypair: Arc::new(keypair),
        }
    }

    pub fn party(&self) -> &Party {
        &self.party
    }

    /// Endorse a proposal digest.
    pub fn endorse(&self, digest: Hash) -> Endorsement {
        Endorsement::sign(&self.keypair, digest)
    }
}
