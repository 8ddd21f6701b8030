//! The pure decision path: protection → scenarios → tactical → synthesis.
//!
//! No I/O. Given the same rule set, protection settings and snapshot, the
//! resulting decision is identical apart from `created_at`.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::decision::{Decision, OpportunityScores};
use crate::protection::ProtectionFilter;
use crate::ruleset::RuleSet;
use crate::scenario::NoMatch;
use crate::scoring::{integrated_score, tactical_score};
use crate::snapshot::{DataUnavailable, Indicator, IndicatorSnapshot};
use crate::synthesis::{synthesize, DecisionPath};

/// Produce exactly one decision for `snapshot`.
///
/// Fails only when a field the protection gate needs is missing; nothing is
/// produced in that case.
pub fn decide(
    rules: &RuleSet,
    protection: &ProtectionFilter,
    snapshot: &IndicatorSnapshot,
    created_at: DateTime<Utc>,
) -> Result<Decision, DataUnavailable> {
    if let Some(trigger) = protection.check(snapshot)? {
        warn!(
            check = %trigger.check,
            observed = trigger.observed,
            threshold = trigger.threshold,
            size_percent = trigger.size_percent,
            "protection filter triggered"
        );
        return Ok(synthesize(
            DecisionPath::Protection(trigger),
            snapshot,
            rules.stamp(),
            None,
            created_at,
        ));
    }

    // Present once the gate has passed.
    let market = snapshot.require(Indicator::MarketScore)?;
    let risk = snapshot.require(Indicator::RiskScore)?;
    let ema = snapshot.value(Indicator::EmaDistancePct);
    let rsi = snapshot.value(Indicator::RsiDaily);

    let tactical_rule = rules.tactical().lookup_snapshot(snapshot);
    let t_score = tactical_score(tactical_rule.action.action(), tactical_rule.size_percent, ema, rsi);

    let (path, bonus) = match rules.scenarios().evaluate(snapshot) {
        Ok(hit) => {
            let bonus = hit.scenario.score_bonus;
            (DecisionPath::Scenario(hit), bonus)
        }
        Err(NoMatch { skipped }) => {
            if ema.is_none() || rsi.is_none() {
                warn!(
                    ema_present = ema.is_some(),
                    rsi_present = rsi.is_some(),
                    "tactical inputs missing, using catch-all row"
                );
            }
            info!(
                rule = %tactical_rule.id,
                skipped = skipped.len(),
                "no scenario matched, using tactical fallback"
            );
            (
                DecisionPath::Tactical {
                    rule: tactical_rule.clone(),
                    skipped,
                },
                0.0,
            )
        }
    };

    let scores = OpportunityScores {
        tactical_rule_id: tactical_rule.id.clone(),
        tactical_score: t_score,
        integrated_score: integrated_score(t_score, market, risk, bonus),
    };

    let decision = synthesize(path, snapshot, rules.stamp(), Some(scores), created_at);
    info!(
        action = %decision.action,
        size_percent = decision.size_percent,
        id = %decision.scenario_or_rule_id,
        matrix = %decision.matrix_used,
        urgency = %decision.urgency,
        "decision synthesized"
    );
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::Action;
    use crate::decision::{MatrixUsed, Urgency};

    fn baseline() -> IndicatorSnapshot {
        IndicatorSnapshot::empty(Utc::now())
            .with(Indicator::MarketScore, 75.0)
            .with(Indicator::RiskScore, 85.0)
            .with(Indicator::Mvrv, 1.5)
            .with(Indicator::EmaDistancePct, 0.0)
            .with(Indicator::RsiDaily, 45.0)
            .with(Indicator::HealthFactor, 2.0)
            .with(Indicator::LiquidationDistancePct, 50.0)
            .with(Indicator::LeverageCurrent, 1.0)
            .with(Indicator::LeverageAllowed, 2.0)
    }

    fn run(snap: &IndicatorSnapshot) -> Decision {
        decide(&RuleSet::builtin(), &ProtectionFilter::default(), snap, Utc::now()).unwrap()
    }

    #[test]
    fn bull_inicial_carries_scores() {
        let d = run(&baseline());
        assert_eq!(d.scenario_or_rule_id, "bull_inicial");
        let scores = d.audit_snapshot.scores.unwrap();
        assert_eq!(scores.tactical_rule_id, "hold_zona_neutra");
        assert_eq!(scores.tactical_score, 50.0);
        // 0.4*50 + 0.3*75 + 0.3*85 + 20
        assert!((scores.integrated_score - 88.0).abs() < 1e-9);
    }

    #[test]
    fn protection_short_circuits_without_scores() {
        let d = run(&baseline().with(Indicator::MarketScore, 20.0));
        assert_eq!(d.matrix_used, MatrixUsed::Protection);
        assert!(d.audit_snapshot.scores.is_none());
    }

    #[test]
    fn missing_gate_field_produces_nothing() {
        let snap = baseline().without(Indicator::LeverageCurrent);
        let err = decide(&RuleSet::builtin(), &ProtectionFilter::default(), &snap, Utc::now())
            .unwrap_err();
        assert_eq!(err.field, Indicator::LeverageCurrent);
    }

    #[test]
    fn unmatched_snapshot_falls_back_to_tactical() {
        let snap = baseline()
            .with(Indicator::Mvrv, 2.5)
            .with(Indicator::EmaDistancePct, 25.0)
            .with(Indicator::RsiDaily, 80.0);
        let d = run(&snap);
        assert_eq!(d.matrix_used, MatrixUsed::TacticalFallback);
        assert_eq!(d.scenario_or_rule_id, "realizar_extremo");
        assert_eq!(d.action, Action::Reduce);
        assert_eq!(d.urgency, Urgency::Baixa);
    }

    #[test]
    fn absent_tactical_inputs_hold() {
        let snap = baseline()
            .with(Indicator::Mvrv, 2.5)
            .without(Indicator::EmaDistancePct)
            .without(Indicator::RsiDaily);
        let d = run(&snap);
        assert_eq!(d.matrix_used, MatrixUsed::TacticalFallback);
        assert_eq!(d.scenario_or_rule_id, "hold_nao_mapeado");
        assert_eq!(d.action, Action::Hold);
        assert_eq!(d.size_percent, 0.0);
    }
}
