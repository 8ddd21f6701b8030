//! Decision synthesis: turn whichever stage fired into a canonical `Decision`.
//!
//! Infallible. Every decision code was resolved to an action when the rule
//! set was parsed, so nothing here can meet an unmapped code.

use chrono::{DateTime, Utc};

use crate::codes::Action;
use crate::decision::{
    AuditTrail, Decision, MatrixUsed, OpportunityScores, PathTrace, RuleSetStamp, Urgency,
    AUDIT_SCHEMA_VERSION,
};
use crate::phase::MarketPhase;
use crate::protection::ProtectionTrigger;
use crate::scenario::{ScenarioMatch, SkippedScenario};
use crate::snapshot::{Indicator, IndicatorSnapshot};
use crate::tactical::TacticalRule;

/// Priority the tactical fallback reports for urgency purposes.
pub const TACTICAL_PRIORITY: u32 = 98;

/// The stage that produced the outcome, with its intermediate values.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionPath {
    Protection(ProtectionTrigger),
    Scenario(ScenarioMatch),
    Tactical {
        rule: TacticalRule,
        skipped: Vec<SkippedScenario>,
    },
}

impl DecisionPath {
    /// Override scenarios are reported as protection decisions.
    pub fn matrix_used(&self) -> MatrixUsed {
        match self {
            DecisionPath::Protection(_) => MatrixUsed::Protection,
            DecisionPath::Scenario(hit) if hit.scenario.is_override => MatrixUsed::Protection,
            DecisionPath::Scenario(_) => MatrixUsed::ScenarioMatrix,
            DecisionPath::Tactical { .. } => MatrixUsed::TacticalFallback,
        }
    }
}

pub fn synthesize(
    path: DecisionPath,
    snapshot: &IndicatorSnapshot,
    ruleset: RuleSetStamp,
    scores: Option<OpportunityScores>,
    created_at: DateTime<Utc>,
) -> Decision {
    let matrix_used = path.matrix_used();
    let fase_mercado = MarketPhase::from_mvrv(snapshot.value(Indicator::Mvrv));

    let (action, size_percent, id, urgency, justification, leverage, stop, target, trace) =
        match path {
            DecisionPath::Protection(trigger) => (
                Action::Reduce,
                trigger.size_percent,
                trigger.check.rule_id().to_string(),
                Urgency::Critica,
                trigger.justification,
                None,
                None,
                None,
                PathTrace::Protection {
                    check: trigger.check,
                    threshold: trigger.threshold,
                    observed: trigger.observed,
                },
            ),
            DecisionPath::Scenario(ScenarioMatch { scenario, skipped }) => {
                let code = scenario.action.decision;
                (
                    code.action(),
                    scenario.action.resolved_size(),
                    scenario.id.clone(),
                    Urgency::from_priority(scenario.priority, scenario.is_override),
                    scenario.action.justification,
                    scenario.action.leverage_recommended,
                    scenario.action.stop_loss_percent,
                    scenario.action.target_description,
                    PathTrace::Scenario {
                        scenario_id: scenario.id,
                        scenario_name: scenario.name,
                        group: scenario.group,
                        priority: scenario.priority,
                        is_override: scenario.is_override,
                        decision_code: code,
                        score_bonus: scenario.score_bonus,
                        skipped,
                    },
                )
            }
            DecisionPath::Tactical { rule, skipped } => (
                rule.action.action(),
                rule.size_percent,
                rule.id.clone(),
                Urgency::from_priority(TACTICAL_PRIORITY, false),
                rule.justification,
                None,
                None,
                None,
                PathTrace::Tactical {
                    rule_id: rule.id,
                    decision_code: rule.action,
                    ema_distance_pct: snapshot.value(Indicator::EmaDistancePct),
                    rsi_daily: snapshot.value(Indicator::RsiDaily),
                    skipped,
                },
            ),
        };

    Decision {
        action,
        size_percent: size_percent.clamp(0.0, 100.0),
        scenario_or_rule_id: id,
        matrix_used,
        urgency,
        justification,
        fase_mercado,
        leverage_recommended: leverage,
        stop_loss_percent: stop,
        target_description: target,
        audit_snapshot: AuditTrail {
            schema_version: AUDIT_SCHEMA_VERSION,
            ruleset,
            snapshot: snapshot.normalized(),
            path: trace,
            scores,
        },
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::DecisionCode;
    use crate::protection::ProtectionCheck;
    use crate::ruleset::RuleSet;

    fn stamp() -> RuleSetStamp {
        RuleSet::builtin().stamp()
    }

    #[test]
    fn protection_path_is_critical_reduce() {
        let snap = IndicatorSnapshot::empty(Utc::now()).with(Indicator::Mvrv, 0.8);
        let trigger = ProtectionTrigger {
            check: ProtectionCheck::RiskScore,
            size_percent: 70.0,
            threshold: 50.0,
            observed: 30.0,
            justification: "Score risco 30.0 abaixo do limite 50.0".into(),
        };
        let d = synthesize(DecisionPath::Protection(trigger), &snap, stamp(), None, Utc::now());
        assert_eq!(d.action, Action::Reduce);
        assert_eq!(d.size_percent, 70.0);
        assert_eq!(d.matrix_used, MatrixUsed::Protection);
        assert_eq!(d.urgency, Urgency::Critica);
        assert_eq!(d.scenario_or_rule_id, "protecao_risco");
        assert_eq!(d.fase_mercado, MarketPhase::Bottom);
        assert_eq!(d.audit_snapshot.snapshot, snap);
    }

    #[test]
    fn override_scenario_reports_protection() {
        let rules = RuleSet::builtin();
        let scenario = rules.scenarios().get("risco_critico").unwrap().clone();
        let path = DecisionPath::Scenario(ScenarioMatch {
            scenario,
            skipped: vec![],
        });
        let d = synthesize(path, &IndicatorSnapshot::empty(Utc::now()), stamp(), None, Utc::now());
        assert_eq!(d.matrix_used, MatrixUsed::Protection);
        assert_eq!(d.action, Action::EmergencyReduce);
        assert_eq!(d.urgency, Urgency::Critica);
        assert_eq!(d.size_percent, 80.0);
        assert_eq!(d.decision_code(), Some(DecisionCode::EmergenciaReduzir));
    }

    #[test]
    fn tactical_path_is_low_urgency() {
        let rules = RuleSet::builtin();
        let rule = rules.tactical().lookup(25.0, 80.0).clone();
        let snap = IndicatorSnapshot::empty(Utc::now())
            .with(Indicator::EmaDistancePct, 25.0)
            .with(Indicator::RsiDaily, 80.0);
        let d = synthesize(
            DecisionPath::Tactical {
                rule,
                skipped: vec![],
            },
            &snap,
            stamp(),
            None,
            Utc::now(),
        );
        assert_eq!(d.matrix_used, MatrixUsed::TacticalFallback);
        assert_eq!(d.urgency, Urgency::Baixa);
        assert_eq!(d.action, Action::Reduce);
        assert_eq!(d.size_percent, 40.0);
        assert_eq!(d.fase_mercado, MarketPhase::Indefinido);
        match d.audit_snapshot.path {
            PathTrace::Tactical { ema_distance_pct, .. } => assert_eq!(ema_distance_pct, Some(25.0)),
            other => panic!("unexpected trace {other:?}"),
        }
    }
}
