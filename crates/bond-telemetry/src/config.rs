//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration for a node.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or full directive
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether to print span enter/exit details
    pub with_spans: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "bond-node".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_spans: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: bond-node)
    /// - `BOND_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `BOND_JSON_LOGS`: Enable JSON logs (default: false outside containers)
    /// - `BOND_LOG_SPANS`: Log span open/close events (default: false)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "bond-node".to_string()),

            log_level: env::var("BOND_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("BOND_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            with_spans: env::var("BOND_LOG_SPANS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    /// Configuration for a named node, e.g. one party in a local network.
    pub fn for_node(node_name: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("bond-node-{}", node_name.to_lowercase());
        config
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
