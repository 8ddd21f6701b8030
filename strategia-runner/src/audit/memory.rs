//! In-process audit store, for tests and dry runs.

use std::sync::{Mutex, PoisonError};

use strategia_core::Decision;

use super::{into_stored, newest_first, AuditStore, DecisionRecord, PersistenceError, StoredDecision};

/// Keeps records in memory in their persisted shape, so reads go through the
/// same schema checks as the file-backed store.
#[derive(Default)]
pub struct InMemoryAuditStore {
    records: Mutex<Vec<DecisionRecord>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditStore for InMemoryAuditStore {
    fn record(&self, decision: &Decision) -> Result<u64, PersistenceError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let id = records.len() as u64 + 1;
        records.push(DecisionRecord::from_decision(id, decision)?);
        Ok(id)
    }

    fn history(&self, limit: usize) -> Result<Vec<StoredDecision>, PersistenceError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        newest_first(&mut records);
        into_stored(records, limit)
    }
}
