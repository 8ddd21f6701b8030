//! Property tests for the audit stores.
//!
//! Uses proptest to verify:
//! 1. Ordering — history is newest first by `created_at`, ties by id, for
//!    any insertion order of timestamps
//! 2. Fidelity — every decision read back from the JSONL log equals the
//!    decision that was recorded
//! 3. Agreement — the JSONL and in-memory stores return the same history

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tempfile::TempDir;

use strategia_core::{decide, Decision, Indicator, IndicatorSnapshot, ProtectionFilter, RuleSet};
use strategia_runner::{AuditStore, InMemoryAuditStore, JsonlAuditStore};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_entry() -> impl Strategy<Value = (i64, f64, f64)> {
    (0..30_i64, 0.0..100.0_f64, 0.0..100.0_f64)
}

fn decision(minute: i64, market: f64, risk: f64) -> Decision {
    let ts = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap() + Duration::minutes(minute);
    let snap = IndicatorSnapshot::empty(ts)
        .with(Indicator::MarketScore, market)
        .with(Indicator::RiskScore, risk)
        .with(Indicator::Mvrv, 1.2)
        .with(Indicator::EmaDistancePct, 3.0)
        .with(Indicator::RsiDaily, 55.0)
        .with(Indicator::LeverageCurrent, 1.5)
        .with(Indicator::LeverageAllowed, 2.0);
    decide(&RuleSet::builtin(), &ProtectionFilter::default(), &snap, ts).unwrap()
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn history_is_newest_first(entries in prop::collection::vec(arb_entry(), 1..12), limit in 0..15_usize) {
        let store = InMemoryAuditStore::new();
        for &(minute, market, risk) in &entries {
            store.record(&decision(minute, market, risk)).unwrap();
        }

        let history = store.history(limit).unwrap();
        prop_assert_eq!(history.len(), limit.min(entries.len()));
        for pair in history.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.decision.created_at > b.decision.created_at
                    || (a.decision.created_at == b.decision.created_at && a.id > b.id)
            );
        }
    }

    #[test]
    fn jsonl_reads_back_what_was_recorded(entries in prop::collection::vec(arb_entry(), 1..8)) {
        let dir = TempDir::new().unwrap();
        let jsonl = JsonlAuditStore::open(dir.path().join("log.jsonl")).unwrap();
        let memory = InMemoryAuditStore::new();

        let mut recorded = Vec::new();
        for &(minute, market, risk) in &entries {
            let d = decision(minute, market, risk);
            let id = jsonl.record(&d).unwrap();
            prop_assert_eq!(memory.record(&d).unwrap(), id);
            recorded.push((id, d));
        }

        let from_file = jsonl.history(usize::MAX).unwrap();
        for stored in &from_file {
            let (_, original) = recorded.iter().find(|(id, _)| *id == stored.id).unwrap();
            prop_assert_eq!(&stored.decision, original);
        }
        prop_assert_eq!(from_file, memory.history(usize::MAX).unwrap());
    }
}
