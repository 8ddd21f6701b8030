//! Replay stored decisions against a rule set.
//!
//! Each stored decision carries the full indicator snapshot in its audit
//! trail, so it can be re-decided under any rule set. A replay reports which
//! decisions would now come out differently. Records are independent, so the
//! work is spread over rayon's pool.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use strategia_core::{
    decide, Action, Decision, MatrixUsed, ProtectionFilter, RuleSet, RuleSetStamp, Urgency,
};

use crate::audit::StoredDecision;

/// The outcome fields compared between stored and replayed decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSummary {
    pub action: Action,
    pub size_percent: f64,
    pub scenario_or_rule_id: String,
    pub matrix_used: MatrixUsed,
    pub urgency: Urgency,
}

impl From<&Decision> for DecisionSummary {
    fn from(d: &Decision) -> Self {
        Self {
            action: d.action,
            size_percent: d.size_percent,
            scenario_or_rule_id: d.scenario_or_rule_id.clone(),
            matrix_used: d.matrix_used,
            urgency: d.urgency,
        }
    }
}

/// A stored decision whose replay differs, or could not be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDiff {
    pub id: u64,
    pub stored: DecisionSummary,
    pub replayed: Option<DecisionSummary>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub ruleset: RuleSetStamp,
    pub total: usize,
    pub unchanged: usize,
    pub drifted: Vec<ReplayDiff>,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.drifted.is_empty()
    }
}

pub fn replay(
    history: &[StoredDecision],
    rules: &RuleSet,
    protection: &ProtectionFilter,
) -> ReplayReport {
    let mut drifted: Vec<ReplayDiff> = history
        .par_iter()
        .filter_map(|stored| replay_one(stored, rules, protection))
        .collect();
    drifted.sort_by_key(|d| d.id);

    let report = ReplayReport {
        ruleset: rules.stamp(),
        total: history.len(),
        unchanged: history.len() - drifted.len(),
        drifted,
    };
    info!(
        version = %report.ruleset.version,
        total = report.total,
        drifted = report.drifted.len(),
        "replay complete"
    );
    report
}

fn replay_one(
    stored: &StoredDecision,
    rules: &RuleSet,
    protection: &ProtectionFilter,
) -> Option<ReplayDiff> {
    let original = &stored.decision;
    let before = DecisionSummary::from(original);
    match decide(
        rules,
        protection,
        &original.audit_snapshot.snapshot,
        original.created_at,
    ) {
        Ok(replayed) => {
            let after = DecisionSummary::from(&replayed);
            (after != before).then(|| ReplayDiff {
                id: stored.id,
                stored: before,
                replayed: Some(after),
                error: None,
            })
        }
        Err(e) => Some(ReplayDiff {
            id: stored.id,
            stored: before,
            replayed: None,
            error: Some(e.to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use strategia_core::{Indicator, IndicatorSnapshot, ProtectionConfig};

    fn stored(id: u64, market: f64) -> StoredDecision {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let snap = IndicatorSnapshot::empty(ts)
            .with(Indicator::MarketScore, market)
            .with(Indicator::RiskScore, 85.0)
            .with(Indicator::Mvrv, 1.5)
            .with(Indicator::EmaDistancePct, 0.0)
            .with(Indicator::RsiDaily, 45.0)
            .with(Indicator::LeverageCurrent, 1.0)
            .with(Indicator::LeverageAllowed, 2.0);
        let decision =
            decide(&RuleSet::builtin(), &ProtectionFilter::default(), &snap, ts).unwrap();
        StoredDecision { id, decision }
    }

    #[test]
    fn same_rules_replay_clean() {
        let history = vec![stored(1, 75.0), stored(2, 45.0), stored(3, 30.0)];
        let report = replay(&history, &RuleSet::builtin(), &ProtectionFilter::default());
        assert!(report.is_clean());
        assert_eq!(report.total, 3);
        assert_eq!(report.unchanged, 3);
    }

    #[test]
    fn raised_floor_drifts_to_protection() {
        let history = vec![stored(1, 75.0), stored(2, 45.0)];
        let stricter = ProtectionFilter::new(ProtectionConfig {
            market_floor: 50.0,
            ..ProtectionConfig::default()
        });
        let report = replay(&history, &RuleSet::builtin(), &stricter);
        assert_eq!(report.drifted.len(), 1);
        let diff = &report.drifted[0];
        assert_eq!(diff.id, 2);
        let replayed = diff.replayed.as_ref().unwrap();
        assert_eq!(replayed.matrix_used, MatrixUsed::Protection);
        assert_eq!(replayed.action, Action::Reduce);
    }
}
