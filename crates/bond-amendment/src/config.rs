//! Workflow configuration.

use std::env;
use std::time::Duration;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct AmendmentConfig {
    /// Upper bound on each counterparty's reply.
    pub endorsement_timeout: Duration,
    /// Upper bound on the notary's verdict.
    pub sequencing_timeout: Duration,
    /// Re-verify counterparty endorsements before sequencing.
    pub verify_endorsements: bool,
}

impl Default for AmendmentConfig {
    fn default() -> Self {
        Self {
            endorsement_timeout: Duration::from_secs(30),
            sequencing_timeout: Duration::from_secs(60),
            verify_endorsements: true,
        }
    }
}

impl AmendmentConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BOND_ENDORSEMENT_TIMEOUT_MS`: per-counterparty reply bound (default: 30000)
    /// - `BOND_SEQUENCING_TIMEOUT_MS`: notary verdict bound (default: 60000)
    /// - `BOND_VERIFY_ENDORSEMENTS`: `false`/`0`/`no` skips re-verification (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endorsement_timeout: millis_from_env("BOND_ENDORSEMENT_TIMEOUT_MS")
                .unwrap_or(defaults.endorsement_timeout),
            sequencing_timeout: millis_from_env("BOND_SEQUENCING_TIMEOUT_MS")
                .unwrap_or(defaults.sequencing_timeout),
            verify_endorsements: flag_from_env("BOND_VERIFY_ENDORSEMENTS")
                .unwrap_or(defaults.verify_endorsements),
        }
    }

    /// Configuration for tests: short timeouts.
    pub fn for_testing() -> Self {
        Self {
            endorsement_timeout: Duration::from_millis(200),
            sequencing_timeout: Duration::from_millis(200),
            verify_endorsements: true,
        }
    }
}

fn millis_from_env(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn flag_from_env(key: &str) -> Option<bool> {
    env::var(key).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
