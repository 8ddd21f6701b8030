//! Bounded-time audit writes.
//!
//! The write runs on a worker thread and the caller waits at most `timeout`
//! for its result over an `mpsc` channel. I/O failures are retried up to
//! `max_retries` times; a timeout is never retried, since the first write may
//! still land and a retry could record the decision twice. Neither is a
//! writer that exits without reporting.
//!
//! A timed-out writer keeps running until the store returns. At most
//! `max_in_flight` writers may be outstanding; past that, writes fail fast
//! with `PersistenceError::Busy` instead of stacking up threads against a
//! wedged store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use strategia_core::Decision;

use super::{AuditStore, PersistenceError};

#[derive(Debug, Clone)]
pub struct PersistencePolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub max_in_flight: usize,
    /// Writer threads currently running. Shared by clones.
    in_flight: Arc<AtomicUsize>,
}

impl Default for PersistencePolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 2, 4)
    }
}

impl PartialEq for PersistencePolicy {
    fn eq(&self, other: &Self) -> bool {
        self.timeout == other.timeout
            && self.max_retries == other.max_retries
            && self.max_in_flight == other.max_in_flight
    }
}

impl Eq for PersistencePolicy {}

/// Releases a writer slot when the writer thread ends, panicking or not.
struct Slot(Arc<AtomicUsize>);

impl Drop for Slot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PersistencePolicy {
    pub fn new(timeout: Duration, max_retries: u32, max_in_flight: usize) -> Self {
        Self {
            timeout,
            max_retries,
            max_in_flight,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Writer threads that have not yet returned, including timed-out ones.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn record(
        &self,
        store: &Arc<dyn AuditStore>,
        decision: &Decision,
    ) -> Result<u64, PersistenceError> {
        let mut attempt = 0;
        loop {
            match self.record_once(Arc::clone(store), decision.clone()) {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, max_retries = self.max_retries, error = %e, "audit write failed, retrying");
                }
                result => return result,
            }
        }
    }

    fn record_once(
        &self,
        store: Arc<dyn AuditStore>,
        decision: Decision,
    ) -> Result<u64, PersistenceError> {
        let slot = self.acquire()?;
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("audit-writer".into())
            .spawn(move || {
                let _slot = slot;
                // The receiver is gone once the caller timed out.
                let _ = tx.send(store.record(&decision));
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(PersistenceError::Timeout {
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            Err(RecvTimeoutError::Disconnected) => Err(PersistenceError::WriterLost),
        }
    }

    fn acquire(&self) -> Result<Slot, PersistenceError> {
        let taken = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_in_flight).then_some(n + 1)
            });
        match taken {
            Ok(_) => Ok(Slot(Arc::clone(&self.in_flight))),
            Err(in_flight) => Err(PersistenceError::Busy { in_flight }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::StoredDecision;
    use chrono::{TimeZone, Utc};
    use strategia_core::{decide, Indicator, IndicatorSnapshot, ProtectionFilter, RuleSet};
    use std::sync::atomic::AtomicU32;
    use std::sync::mpsc::Receiver;
    use std::sync::Mutex;

    fn decision() -> Decision {
        let ts = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        let snap = IndicatorSnapshot::empty(ts)
            .with(Indicator::MarketScore, 75.0)
            .with(Indicator::RiskScore, 85.0)
            .with(Indicator::LeverageCurrent, 1.0)
            .with(Indicator::LeverageAllowed, 2.0);
        decide(&RuleSet::builtin(), &ProtectionFilter::default(), &snap, ts).unwrap()
    }

    /// Panics inside `record`, after counting the attempt.
    #[derive(Default)]
    struct PanickingStore {
        attempts: AtomicU32,
    }

    impl AuditStore for PanickingStore {
        fn record(&self, _decision: &Decision) -> Result<u64, PersistenceError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            panic!("store crashed mid-write");
        }

        fn history(&self, _limit: usize) -> Result<Vec<StoredDecision>, PersistenceError> {
            Ok(Vec::new())
        }
    }

    /// Blocks every write until the test releases it.
    struct WedgedStore {
        release: Mutex<Receiver<()>>,
    }

    impl AuditStore for WedgedStore {
        fn record(&self, _decision: &Decision) -> Result<u64, PersistenceError> {
            let _ = self
                .release
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .recv();
            Ok(1)
        }

        fn history(&self, _limit: usize) -> Result<Vec<StoredDecision>, PersistenceError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn lost_writer_is_not_retried() {
        let store = Arc::new(PanickingStore::default());
        let dyn_store: Arc<dyn AuditStore> = store.clone();
        let policy = PersistencePolicy::new(Duration::from_secs(2), 3, 4);

        let err = policy.record(&dyn_store, &decision()).unwrap_err();
        assert!(matches!(err, PersistenceError::WriterLost));
        assert!(!err.is_retryable());
        assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wedged_store_is_bounded_by_max_in_flight() {
        let (release, rx) = mpsc::channel();
        let store: Arc<dyn AuditStore> = Arc::new(WedgedStore {
            release: Mutex::new(rx),
        });
        let policy = PersistencePolicy::new(Duration::from_millis(20), 0, 2);

        for _ in 0..2 {
            let err = policy.record(&store, &decision()).unwrap_err();
            assert!(matches!(err, PersistenceError::Timeout { .. }));
        }
        assert_eq!(policy.in_flight(), 2);

        let err = policy.record(&store, &decision()).unwrap_err();
        assert!(matches!(err, PersistenceError::Busy { in_flight: 2 }));
        assert_eq!(policy.in_flight(), 2);

        // Unblock both writers; their slots are released as they exit.
        release.send(()).unwrap();
        release.send(()).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while policy.in_flight() > 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(policy.in_flight(), 0);
    }

    #[test]
    fn equality_ignores_the_writer_count() {
        let a = PersistencePolicy::default();
        let b = PersistencePolicy::default();
        a.in_flight.fetch_add(1, Ordering::SeqCst);
        assert_eq!(a, b);
    }
}
