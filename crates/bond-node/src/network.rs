//! In-process three-party network.
//!
//! ```text
//!   Bank (AmendmentService) ──ChannelSessionProvider──┬──→ Exporter responder task
//!          │                                          └──→ Guarantor responder task
//!          └── submit ──→ InMemoryNotary ──→ InMemoryVault
//! ```

use crate::config::NodeConfig;
use bond_amendment::adapters::{
    spawn_responder, ChannelSessionProvider, InMemoryNotary, InMemoryVault, ResponderHandle,
};
use bond_amendment::ports::EventPublisher;
use bond_amendment::{
    AmendmentRequest, AmendmentService, BondContract, Counterparties, ExporterBooksPolicy,
    LocalIdentity, ResponderService, RiskCeilingPolicy, SequencingError,
};
use shared_crypto::PartyKeyPair;
use shared_types::{Bond, BondTerms, Participants, TermsUpdate, VersionRef};
use std::sync::Arc;
use tracing::info;

/// The bank's orchestrator as wired here.
pub type BankService =
    AmendmentService<InMemoryVault, BondContract, ChannelSessionProvider, InMemoryNotary>;

/// Signing keys of the three parties.
pub struct PartyKeys {
    pub exporter: PartyKeyPair,
    pub bank: PartyKeyPair,
    pub guarantor: PartyKeyPair,
}

impl PartyKeys {
    pub fn generate() -> Self {
        Self {
            exporter: PartyKeyPair::generate(),
            bank: PartyKeyPair::generate(),
            guarantor: PartyKeyPair::generate(),
        }
    }

    pub fn from_seeds(exporter: [u8; 32], bank: [u8; 32], guarantor: [u8; 32]) -> Self {
        Self {
            exporter: PartyKeyPair::from_seed(exporter),
            bank: PartyKeyPair::from_seed(bank),
            guarantor: PartyKeyPair::from_seed(guarantor),
        }
    }
}

/// Everything one local network owns.
pub struct LocalNetwork {
    pub vault: Arc<InMemoryVault>,
    pub notary: Arc<InMemoryNotary>,
    pub sessions: Arc<ChannelSessionProvider>,
    pub bank: BankService,
    pub participants: Participants,
    responders: Vec<ResponderHandle>,
}

impl LocalNetwork {
    /// Wire the parties and start the responder tasks. Needs a tokio runtime.
    pub fn start(config: &NodeConfig, keys: PartyKeys, events: Arc<dyn EventPublisher>) -> Self {
        let contract = Arc::new(BondContract::new());
        let exporter = LocalIdentity::new(config.exporter_name.clone(), keys.exporter);
        let bank = LocalIdentity::new(config.bank_name.clone(), keys.bank);
        let guarantor = LocalIdentity::new(config.guarantor_name.clone(), keys.guarantor);

        let participants = Participants::new(
            exporter.party().clone(),
            bank.party().clone(),
            guarantor.party().clone(),
        );

        let exporter_books = ExporterBooksPolicy::new(
            config.exporter_books.turnover,
            config.exporter_books.net,
        );
        let exporter_handle = spawn_responder(
            exporter.party().clone(),
            Arc::new(ResponderService::new(exporter, contract.clone(), exporter_books)),
        );
        let guarantor_handle = spawn_responder(
            guarantor.party().clone(),
            Arc::new(ResponderService::new(
                guarantor,
                contract.clone(),
                RiskCeilingPolicy::new(config.guarantor_max_risk),
            )),
        );

        let sessions = Arc::new(ChannelSessionProvider::new(bank.party().clone()));
        sessions.register(&exporter_handle);
        sessions.register(&guarantor_handle);

        let vault = Arc::new(InMemoryVault::new());
        let notary = Arc::new(InMemoryNotary::new(vault.clone(), contract.clone()));
        let bank = AmendmentService::new(
            config.amendment.clone(),
            bank,
            vault.clone(),
            contract,
            sessions.clone(),
            notary.clone(),
            events,
        );

        info!(
            exporter = %participants.exporter,
            bank = %participants.bank,
            guarantor = %participants.guarantor,
            "[node] local network started"
        );

        Self {
            vault,
            notary,
            sessions,
            bank,
            participants,
            responders: vec![exporter_handle, guarantor_handle],
        }
    }

    /// Issue a fresh bond owned by the three parties.
    pub fn issue_bond(&self, bond_id: &str, face_value: u64) -> Result<VersionRef, SequencingError> {
        self.notary.issue(Bond::new(
            bond_id,
            face_value,
            self.participants.clone(),
            BondTerms::default(),
        ))
    }

    /// Request from the bank to apply `update` to `record_id`.
    pub fn bank_request(&self, record_id: &str, update: TermsUpdate) -> AmendmentRequest {
        AmendmentRequest {
            record_id: record_id.to_string(),
            proposer: self.participants.bank.clone(),
            counterparties: Counterparties {
                exporter: self.participants.exporter.clone(),
                guarantor: self.participants.guarantor.clone(),
            },
            update,
        }
    }

    /// Stop the responder tasks.
    pub fn shutdown(self) {
        for handle in self.responders {
            handle.shutdown();
        }
    }
}
