//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Parties**: `Party`, `PartyRole`, `Participants`
//! - **Bond**: `Bond`, `BondTerms`, `TermsUpdate`
//! - **Versions**: `VersionRef`, `StateAndRef`

use crate::errors::ProposalError;
use serde::{Deserialize, Serialize};
use shared_crypto::{domain_digest, Digest, PartyPublicKey};
use std::fmt;

/// Domain tag for genesis (issuance) digests.
pub const ISSUANCE_DOMAIN: &str = "bond-amendment/issuance/v1";

// =============================================================================
// CLUSTER A: PARTIES
// =============================================================================

/// A legal entity taking part in a bond, identified by its owning key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    /// Human-readable legal name.
    pub name: String,
    /// Ed25519 owning key.
    pub key: PartyPublicKey,
}

impl Party {
    pub fn new(name: impl Into<String>, key: PartyPublicKey) -> Self {
        Self {
            name: name.into(),
            key,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.key)
    }
}

/// Role a party plays on a bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartyRole {
    Exporter,
    Bank,
    Guarantor,
}

impl PartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyRole::Exporter => "exporter",
            PartyRole::Bank => "bank",
            PartyRole::Guarantor => "guarantor",
        }
    }
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three owners of a bond. Fixed for the life of the bond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participants {
    pub exporter: Party,
    pub bank: Party,
    pub guarantor: Party,
}

impl Participants {
    pub fn new(exporter: Party, bank: Party, guarantor: Party) -> Self {
        Self {
            exporter,
            bank,
            guarantor,
        }
    }

    /// Party holding `role`.
    pub fn get(&self, role: PartyRole) -> &Party {
        match role {
            PartyRole::Exporter => &self.exporter,
            PartyRole::Bank => &self.bank,
            PartyRole::Guarantor => &self.guarantor,
        }
    }

    /// Owning keys in role order (exporter, bank, guarantor).
    pub fn keys(&self) -> [PartyPublicKey; 3] {
        [self.exporter.key, self.bank.key, self.guarantor.key]
    }

    /// Role held by the owner of `key`, if any.
    pub fn role_of(&self, key: &PartyPublicKey) -> Option<PartyRole> {
        [PartyRole::Exporter, PartyRole::Bank, PartyRole::Guarantor]
            .into_iter()
            .find(|role| self.get(*role).key == *key)
    }
}

// =============================================================================
// CLUSTER B: THE BOND
// =============================================================================

/// Mutable business fields of a bond, replaced wholesale on each amendment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BondTerms {
    /// Supply contract identifier assigned internally by the bank.
    pub bank_supply_contract_id: Option<String>,
    /// Exporter annual turnover.
    pub exporter_turnover: f64,
    /// Exporter net income.
    pub exporter_net: f64,
    /// Bank risk assessment, 0 (lowest) to 5 (highest).
    pub risk_level: u8,
    /// Bank credit score, 0.0 (lowest) to 4.0 (highest).
    pub credit_score: f64,
    /// Supply contract identifier assigned by the guarantee agency.
    pub guarantor_supply_contract_id: Option<String>,
    /// Whether the guarantee agency supports the bond.
    pub guarantor_supported: Option<bool>,
}

/// Field-level changes requested by a proposer. `None` leaves a field as is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TermsUpdate {
    pub bank_supply_contract_id: Option<String>,
    pub exporter_turnover: Option<f64>,
    pub exporter_net: Option<f64>,
    pub risk_level: Option<u8>,
    pub credit_score: Option<f64>,
}

impl TermsUpdate {
    /// Produce a new terms value with this update applied to `current`.
    pub fn apply_to(&self, current: &BondTerms) -> BondTerms {
        BondTerms {
            bank_supply_contract_id: self
                .bank_supply_contract_id
                .clone()
                .or_else(|| current.bank_supply_contract_id.clone()),
            exporter_turnover: self.exporter_turnover.unwrap_or(current.exporter_turnover),
            exporter_net: self.exporter_net.unwrap_or(current.exporter_net),
            risk_level: self.risk_level.unwrap_or(current.risk_level),
            credit_score: self.credit_score.unwrap_or(current.credit_score),
            guarantor_supply_contract_id: current.guarantor_supply_contract_id.clone(),
            guarantor_supported: current.guarantor_supported,
        }
    }
}

/// One immutable snapshot of a bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    /// Business key, unique among live bonds.
    pub bond_id: String,
    /// Face value in minor currency units. Never changes.
    pub face_value: u64,
    /// Owners. Never change.
    pub participants: Participants,
    /// Current business terms.
    pub terms: BondTerms,
}

impl Bond {
    pub fn new(
        bond_id: impl Into<String>,
        face_value: u64,
        participants: Participants,
        terms: BondTerms,
    ) -> Self {
        Self {
            bond_id: bond_id.into(),
            face_value,
            participants,
            terms,
        }
    }

    /// Successor snapshot carrying `terms`; identity fields are copied.
    pub fn with_terms(&self, terms: BondTerms) -> Self {
        Self {
            bond_id: self.bond_id.clone(),
            face_value: self.face_value,
            participants: self.participants.clone(),
            terms,
        }
    }

    /// Digest identifying the issuance of this bond as a genesis version.
    pub fn issuance_digest(&self) -> Result<Digest, ProposalError> {
        let bytes = bincode::serialize(self)?;
        Ok(domain_digest(ISSUANCE_DOMAIN, &bytes))
    }
}

// =============================================================================
// CLUSTER C: VERSIONS
// =============================================================================

/// Reference to one version of a bond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRef {
    /// Business key of the bond.
    pub record_id: String,
    /// 0 for the issued version, incremented on each commit.
    pub sequence: u64,
    /// Digest of the proposal (or issuance) that produced this version.
    pub transition_id: Digest,
}

impl VersionRef {
    pub fn genesis(record_id: impl Into<String>, issuance: Digest) -> Self {
        Self {
            record_id: record_id.into(),
            sequence: 0,
            transition_id: issuance,
        }
    }

    /// Reference the successor produced by `transition_id`.
    pub fn successor(&self, transition_id: Digest) -> Self {
        Self {
            record_id: self.record_id.clone(),
            sequence: self.sequence + 1,
            transition_id,
        }
    }

    /// Short printable form, e.g. `B-001@3`.
    pub fn short(&self) -> String {
        format!("{}@{}", self.record_id, self.sequence)
    }
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}#{:02x}{:02x}{:02x}{:02x}",
            self.record_id,
            self.sequence,
            self.transition_id[0],
            self.transition_id[1],
            self.transition_id[2],
            self.transition_id[3]
        )
    }
}

/// A bond version together with its reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateAndRef {
    pub reference: VersionRef,
    pub state: Bond,
}
