//! Audit persistence: append-only decision log with latest/history reads.
//!
//! Every decision is written as one independent record carrying the persisted
//! columns plus the verbatim, versioned `audit_json` blob. Reads return the
//! newest decisions first.

mod jsonl;
mod memory;
mod policy;
mod record;

use std::io;

use thiserror::Error;

use strategia_core::Decision;

pub use jsonl::JsonlAuditStore;
pub use memory::InMemoryAuditStore;
pub use policy::PersistencePolicy;
pub use record::DecisionRecord;

/// Errors from the audit store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("audit store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("audit write did not complete within {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error("audit writer exited without reporting a result")]
    WriterLost,
    #[error("{in_flight} audit writes still pending, refusing to start another")]
    Busy { in_flight: usize },
    #[error("audit record {id} is corrupt: {reason}")]
    Corrupt { id: u64, reason: String },
    #[error("audit record {id} uses schema version {found} (max supported: {supported})")]
    UnsupportedSchema { id: u64, found: u32, supported: u32 },
}

impl PersistenceError {
    /// Whether a retry may succeed without risking a duplicate write.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PersistenceError::Io(_))
    }
}

/// A decision as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDecision {
    pub id: u64,
    pub decision: Decision,
}

/// Append-only decision storage.
///
/// Implementations must be safe to share across threads: the engine writes
/// from a persistence worker while readers query latest/history.
pub trait AuditStore: Send + Sync {
    /// Append one decision and return its assigned id.
    fn record(&self, decision: &Decision) -> Result<u64, PersistenceError>;

    /// Most recent decision by `created_at`, ties broken by id.
    fn latest(&self) -> Result<Option<StoredDecision>, PersistenceError> {
        Ok(self.history(1)?.into_iter().next())
    }

    /// Up to `limit` decisions, newest first.
    fn history(&self, limit: usize) -> Result<Vec<StoredDecision>, PersistenceError>;
}

/// Newest first: descending `created_at`, then descending id.
pub(crate) fn newest_first(records: &mut [DecisionRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

pub(crate) fn into_stored(
    records: Vec<DecisionRecord>,
    limit: usize,
) -> Result<Vec<StoredDecision>, PersistenceError> {
    records
        .into_iter()
        .take(limit)
        .map(DecisionRecord::into_stored)
        .collect()
}
