//! # Bond Telemetry
//!
//! Logging and metrics exposition for bond amendment nodes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bond_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // tracing macros now go to stdout
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `bond-node` | Service name on log lines |
//! | `BOND_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `BOND_JSON_LOGS` | `false` | JSON output |
//! | `BOND_LOG_SPANS` | `false` | Log span open/close |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use prometheus::{Encoder, TextEncoder};
use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Failed to encode metrics: {0}")]
    MetricsEncode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging for the process. Call once, early.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)
}

/// Render every metric in the default Prometheus registry in text format.
///
/// Empty unless some crate registered metrics (e.g. `bond-amendment` with the
/// `metrics` feature).
pub fn render_metrics() -> Result<String, TelemetryError> {
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsEncode(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsEncode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_metrics_without_registrations() {
        assert!(render_metrics().is_ok());
    }
}
