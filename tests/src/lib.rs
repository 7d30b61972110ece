//! # Bond Amendment Test Suite
//!
//! Cross-party flows run against the real adapters: channel sessions to
//! responder tasks, the in-memory notary and the vault it writes.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs        # Single-workflow outcomes end to end
//!     └── concurrency.rs  # Racing workflows, timeouts, cancellation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bond-tests
//! cargo test -p bond-tests integration::concurrency::
//! ```

pub mod integration;
