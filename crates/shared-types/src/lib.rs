//! # Shared Types Crate
//!
//! Domain entities and wire messages shared by every party to a bond.
//!
//! ## Design Principles
//!
//! - **Immutable versions**: a [`Bond`] value is never amended in place;
//!   [`Bond::with_terms`] builds the successor.
//! - **Canonical encoding**: proposals are hashed over their bincode encoding,
//!   so every party derives the same digest from the same bytes.
//! - **Key-based identity**: a [`Party`] is identified by its Ed25519 owning
//!   key; names are informational.

pub mod entities;
pub mod errors;
pub mod proposal;

pub use entities::*;
pub use errors::*;
pub use proposal::*;

pub use shared_crypto::{Digest as Hash, PartyPublicKey, PartySignature};
