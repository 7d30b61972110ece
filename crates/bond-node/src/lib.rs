//! # Bond Node
//!
//! Wiring for a single-process bond amendment network.
//!
//! - `config` - Node configuration from environment
//! - `network` - Parties, responders, notary and vault wired together

pub mod config;
pub mod network;

pub use config::{ConfigError, ExporterBooks, NodeConfig};
pub use network::{BankService, LocalNetwork, PartyKeys};
