//! In-memory version history.
//!
//! Readers go through [`RecordStore`]. The only writers are the notary's
//! commit and issuance paths, each under a single write lock.

use crate::error::StoreError;
use crate::ports::outbound::RecordStore;
use parking_lot::RwLock;
use shared_types::{Bond, Hash, StateAndRef, VersionRef};
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct VersionEntry {
    version: StateAndRef,
    current: bool,
}

/// Result of an atomic commit attempt.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CommitOutcome {
    Committed(VersionRef),
    /// Input already historical; carries the version that consumed it.
    Superseded(Option<VersionRef>),
    UnknownInput,
    InputMismatch,
}

/// Authoritative store of every bond version.
#[derive(Debug, Default)]
pub struct InMemoryVault {
    records: RwLock<HashMap<String, Vec<VersionEntry>>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every version of `record_id`, oldest first.
    pub fn history(&self, record_id: &str) -> Vec<StateAndRef> {
        self.records
            .read()
            .get(record_id)
            .map(|versions| versions.iter().map(|e| e.version.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of versions of `record_id` currently marked current.
    pub fn current_count(&self, record_id: &str) -> usize {
        self.records
            .read()
            .get(record_id)
            .map(|versions| versions.iter().filter(|e| e.current).count())
            .unwrap_or(0)
    }

    /// Record a genesis version. Refused if the bond already has a live version.
    pub(crate) fn insert_genesis(&self, bond: Bond, issuance: Hash) -> Option<VersionRef> {
        let mut records = self.records.write();
        let versions = records.entry(bond.bond_id.clone()).or_default();
        if versions.iter().any(|e| e.current) {
            return None;
        }
        let reference = VersionRef::genesis(bond.bond_id.clone(), issuance);
        versions.push(VersionEntry {
            version: StateAndRef {
                reference: reference.clone(),
                state: bond,
            },
            current: true,
        });
        Some(reference)
    }

    /// Consume `input` and make `output` current, atomically.
    pub(crate) fn commit(
        &self,
        input: &StateAndRef,
        output: Bond,
        transition_id: Hash,
    ) -> CommitOutcome {
        let mut records = self.records.write();
        let Some(versions) = records.get_mut(&input.reference.record_id) else {
            return CommitOutcome::UnknownInput;
        };
        let Some(pos) = versions
            .iter()
            .position(|e| e.version.reference == input.reference)
        else {
            return CommitOutcome::UnknownInput;
        };

        if !versions[pos].current {
            let next_sequence = input.reference.sequence + 1;
            let consumed_by = versions
                .iter()
                .find(|e| e.version.reference.sequence == next_sequence)
                .map(|e| e.version.reference.clone());
            return CommitOutcome::Superseded(consumed_by);
        }
        if versions[pos].version.state != input.state {
            return CommitOutcome::InputMismatch;
        }

        versions[pos].current = false;
        let reference = input.reference.successor(transition_id);
        versions.push(VersionEntry {
            version: StateAndRef {
                reference: reference.clone(),
                state: output,
            },
            current: true,
        });
        CommitOutcome::Committed(reference)
    }
}

impl RecordStore for InMemoryVault {
    fn find_current(&self, record_id: &str) -> Result<StateAndRef, StoreError> {
        let records = self.records.read();
        let mut current = records
            .get(record_id)
            .into_iter()
            .flatten()
            .filter(|e| e.current);

        match (current.next(), current.next()) {
            (Some(entry), None) => Ok(entry.version.clone()),
            (None, _) => Err(StoreError::NotFound {
                record_id: record_id.to_string(),
            }),
            (Some(_), Some(_)) => Err(StoreError::Corruption {
                record_id: record_id.to_string(),
                current_count: 2 + current.count(),
            }),
        }
    }
}
