//! Scenario definitions and condition matching.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codes::DecisionCode;
use crate::range::{Range, RangeError};
use crate::snapshot::{Indicator, IndicatorSnapshot};

/// Coarse market regime a scenario belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioGroup {
    Bull,
    Bear,
    Neutral,
    Emergency,
}

impl ScenarioGroup {
    pub const ALL: [ScenarioGroup; 4] = [
        ScenarioGroup::Bull,
        ScenarioGroup::Bear,
        ScenarioGroup::Neutral,
        ScenarioGroup::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioGroup::Bull => "bull",
            ScenarioGroup::Bear => "bear",
            ScenarioGroup::Neutral => "neutral",
            ScenarioGroup::Emergency => "emergency",
        }
    }
}

impl fmt::Display for ScenarioGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-indicator ranges, ANDed. An unset field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Conditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_score: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mvrv: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nupl: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ema_distance_pct: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi_daily: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_factor: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidation_distance_pct: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbw_pct: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage_current: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage_allowed: Option<Range>,
}

impl Conditions {
    pub fn get(&self, field: Indicator) -> Option<&Range> {
        match field {
            Indicator::MarketScore => self.market_score.as_ref(),
            Indicator::RiskScore => self.risk_score.as_ref(),
            Indicator::Mvrv => self.mvrv.as_ref(),
            Indicator::Nupl => self.nupl.as_ref(),
            Indicator::EmaDistancePct => self.ema_distance_pct.as_ref(),
            Indicator::RsiDaily => self.rsi_daily.as_ref(),
            Indicator::HealthFactor => self.health_factor.as_ref(),
            Indicator::LiquidationDistancePct => self.liquidation_distance_pct.as_ref(),
            Indicator::BbwPct => self.bbw_pct.as_ref(),
            Indicator::LeverageCurrent => self.leverage_current.as_ref(),
            Indicator::LeverageAllowed => self.leverage_allowed.as_ref(),
        }
    }

    /// Constrained fields in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (Indicator, &Range)> + '_ {
        Indicator::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|range| (field, range)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// What a matched scenario recommends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAction {
    pub decision: DecisionCode,
    /// Falls back to the decision code's default size when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage_recommended: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_description: Option<String>,
    pub justification: String,
}

impl ScenarioAction {
    pub fn resolved_size(&self) -> f64 {
        self.size_percent
            .unwrap_or_else(|| self.decision.default_size_percent())
    }
}

/// A named multi-condition market regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub group: ScenarioGroup,
    /// Lower evaluates first. 0 is reserved for override scenarios.
    pub priority: u32,
    #[serde(rename = "override", default)]
    pub is_override: bool,
    #[serde(default)]
    pub score_bonus: f64,
    #[serde(default)]
    pub conditions: Conditions,
    pub action: ScenarioAction,
}

/// A scenario whose conditions are themselves malformed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("scenario '{scenario_id}' has an invalid condition on '{field}': {reason}")]
pub struct ScenarioConditionError {
    pub scenario_id: String,
    pub field: Indicator,
    pub reason: RangeError,
}

/// Result of testing one scenario against one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOutcome {
    Matched,
    /// First constrained field whose value fell outside its range.
    Failed { field: Indicator },
    /// A constrained field the snapshot does not carry.
    FieldAbsent { field: Indicator },
}

impl ScenarioDefinition {
    /// Test every condition against `snapshot`.
    ///
    /// Malformed ranges are reported before absence, and absence before any
    /// range test, so the outcome does not depend on field order.
    pub fn matches(
        &self,
        snapshot: &IndicatorSnapshot,
    ) -> Result<ConditionOutcome, ScenarioConditionError> {
        for (field, range) in self.conditions.iter() {
            range
                .validate()
                .map_err(|reason| ScenarioConditionError {
                    scenario_id: self.id.clone(),
                    field,
                    reason,
                })?;
        }

        if let Some((field, _)) = self
            .conditions
            .iter()
            .find(|(field, _)| snapshot.value(*field).is_none())
        {
            return Ok(ConditionOutcome::FieldAbsent { field });
        }

        for (field, range) in self.conditions.iter() {
            match snapshot.value(field) {
                Some(v) if range.contains(v) => {}
                _ => return Ok(ConditionOutcome::Failed { field }),
            }
        }
        Ok(ConditionOutcome::Matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn scenario(conditions: Conditions) -> ScenarioDefinition {
        ScenarioDefinition {
            id: "teste".into(),
            name: "Teste".into(),
            description: String::new(),
            group: ScenarioGroup::Bull,
            priority: 1,
            is_override: false,
            score_bonus: 0.0,
            conditions,
            action: ScenarioAction {
                decision: DecisionCode::Entrar,
                size_percent: None,
                leverage_recommended: None,
                stop_loss_percent: None,
                target_description: None,
                justification: "teste".into(),
            },
        }
    }

    #[test]
    fn all_conditions_must_hold() {
        let s = scenario(Conditions {
            market_score: Some(Range::at_least(70.0)),
            mvrv: Some(Range::between(1.0, 2.0)),
            ..Default::default()
        });
        let snap = IndicatorSnapshot::empty(Utc::now())
            .with(Indicator::MarketScore, 75.0)
            .with(Indicator::Mvrv, 1.5);
        assert_eq!(s.matches(&snap).unwrap(), ConditionOutcome::Matched);

        let snap = snap.with(Indicator::Mvrv, 2.0);
        assert_eq!(
            s.matches(&snap).unwrap(),
            ConditionOutcome::Failed {
                field: Indicator::Mvrv
            }
        );
    }

    #[test]
    fn absent_field_reported_even_after_a_failing_one() {
        let s = scenario(Conditions {
            market_score: Some(Range::at_least(70.0)),
            bbw_pct: Some(Range::below(8.0)),
            ..Default::default()
        });
        let snap = IndicatorSnapshot::empty(Utc::now()).with(Indicator::MarketScore, 10.0);
        assert_eq!(
            s.matches(&snap).unwrap(),
            ConditionOutcome::FieldAbsent {
                field: Indicator::BbwPct
            }
        );
    }

    #[test]
    fn malformed_range_is_a_local_error() {
        let s = scenario(Conditions {
            rsi_daily: Some(Range::between(60.0, 40.0)),
            ..Default::default()
        });
        let err = s.matches(&IndicatorSnapshot::empty(Utc::now())).unwrap_err();
        assert_eq!(err.scenario_id, "teste");
        assert_eq!(err.field, Indicator::RsiDaily);
    }

    #[test]
    fn unset_size_uses_code_default() {
        let s = scenario(Conditions::default());
        assert_eq!(s.action.resolved_size(), 40.0);
    }

    #[test]
    fn unknown_condition_key_is_rejected() {
        let parsed = toml::from_str::<Conditions>("rsi = { min = 30.0 }");
        assert!(parsed.is_err());
    }
}
