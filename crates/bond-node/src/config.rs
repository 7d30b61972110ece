//! # Node Configuration
//!
//! What the demo network issues, what the bank proposes and what each
//! counterparty will accept. Every value can be overridden from the
//! environment; the defaults issue `B-001` (face value 1000) and have the bank
//! assess it at risk level 3.

use bond_amendment::AmendmentConfig;
use shared_types::TermsUpdate;
use std::env;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}={value} is not a valid {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Figures the exporter holds in its own books.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExporterBooks {
    pub turnover: f64,
    pub net: f64,
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Business key of the bond to issue and amend.
    pub bond_id: String,
    /// Face value in minor units.
    pub face_value: u64,
    pub exporter_name: String,
    pub bank_name: String,
    pub guarantor_name: String,
    /// The bank's assessment.
    pub update: TermsUpdate,
    pub exporter_books: ExporterBooks,
    /// Highest risk level the guarantor endorses.
    pub guarantor_max_risk: u8,
    pub amendment: AmendmentConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bond_id: "B-001".to_string(),
            face_value: 1000,
            exporter_name: "Exporter".to_string(),
            bank_name: "Bank".to_string(),
            guarantor_name: "Guarantor".to_string(),
            update: TermsUpdate {
                risk_level: Some(3),
                ..Default::default()
            },
            exporter_books: ExporterBooks {
                turnover: 0.0,
                net: 0.0,
            },
            guarantor_max_risk: 5,
            amendment: AmendmentConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables over the defaults.
    ///
    /// # Environment Variables
    ///
    /// - `BOND_ID`, `BOND_FACE_VALUE`
    /// - `BOND_EXPORTER_NAME`, `BOND_BANK_NAME`, `BOND_GUARANTOR_NAME`
    /// - `BOND_RISK_LEVEL`, `BOND_CREDIT_SCORE`, `BOND_TURNOVER`, `BOND_NET`
    /// - `BOND_SUPPLY_CONTRACT_ID` (a fresh UUID when unset)
    /// - `BOND_EXPORTER_BOOKS_TURNOVER`, `BOND_EXPORTER_BOOKS_NET`
    /// - `BOND_GUARANTOR_MAX_RISK`
    /// - plus everything [`AmendmentConfig::from_env`] reads
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let update = TermsUpdate {
            bank_supply_contract_id: Some(
                env::var("BOND_SUPPLY_CONTRACT_ID").unwrap_or_else(|_| Uuid::new_v4().to_string()),
            ),
            exporter_turnover: parse_opt("BOND_TURNOVER", "number")?,
            exporter_net: parse_opt("BOND_NET", "number")?,
            risk_level: parse_opt("BOND_RISK_LEVEL", "risk level")?.or(defaults.update.risk_level),
            credit_score: parse_opt("BOND_CREDIT_SCORE", "number")?,
        };

        // Unless told otherwise the exporter's books agree with the bank.
        let exporter_books = ExporterBooks {
            turnover: parse_opt("BOND_EXPORTER_BOOKS_TURNOVER", "number")?
                .or(update.exporter_turnover)
                .unwrap_or(defaults.exporter_books.turnover),
            net: parse_opt("BOND_EXPORTER_BOOKS_NET", "number")?
                .or(update.exporter_net)
                .unwrap_or(defaults.exporter_books.net),
        };

        Ok(Self {
            bond_id: env::var("BOND_ID").unwrap_or(defaults.bond_id),
            face_value: parse_opt("BOND_FACE_VALUE", "amount")?.unwrap_or(defaults.face_value),
            exporter_name: env::var("BOND_EXPORTER_NAME").unwrap_or(defaults.exporter_name),
            bank_name: env::var("BOND_BANK_NAME").unwrap_or(defaults.bank_name),
            guarantor_name: env::var("BOND_GUARANTOR_NAME").unwrap_or(defaults.guarantor_name),
            update,
            exporter_books,
            guarantor_max_risk: parse_opt("BOND_GUARANTOR_MAX_RISK", "risk level")?
                .unwrap_or(defaults.guarantor_max_risk),
            amendment: AmendmentConfig::from_env(),
        })
    }
}

fn parse_opt<T: FromStr>(key: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key,
                value,
                expected,
            }),
        Err(_) => Ok(None),
    }
}
