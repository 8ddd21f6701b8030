//! Tactical fallback matrix: EMA distance × daily RSI lookup.
//!
//! Consulted only when no scenario matched. Rows are tested in table order
//! with closed ranges; the table must end in a catch-all HOLD row so a lookup
//! always yields a rule.

pub mod defaults;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::codes::{Action, DecisionCode};
use crate::range::Range;
use crate::ruleset::RuleSetError;
use crate::snapshot::{Indicator, IndicatorSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalRule {
    pub id: String,
    pub action: DecisionCode,
    pub size_percent: f64,
    pub justification: String,
    #[serde(default)]
    pub ema_distance: Range,
    #[serde(default)]
    pub rsi: Range,
}

impl TacticalRule {
    pub fn contains(&self, ema_distance_pct: f64, rsi_daily: f64) -> bool {
        self.ema_distance.contains_closed(ema_distance_pct) && self.rsi.contains_closed(rsi_daily)
    }

    /// Open on both axes, HOLD-mapped and sized 0%.
    pub fn is_catch_all(&self) -> bool {
        self.ema_distance.is_open()
            && self.rsi.is_open()
            && self.action.action() == Action::Hold
            && self.size_percent == 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TacticalMatrix {
    rules: Vec<TacticalRule>,
    catch_all: usize,
}

impl TacticalMatrix {
    /// Validate a rule table. Requires at least one catch-all row.
    pub fn new(rules: Vec<TacticalRule>) -> Result<Self, RuleSetError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleSetError::DuplicateTacticalRule {
                    id: rule.id.clone(),
                });
            }
            for (axis, range) in [("ema_distance", &rule.ema_distance), ("rsi", &rule.rsi)] {
                range
                    .validate()
                    .map_err(|reason| RuleSetError::InvalidTacticalRange {
                        rule_id: rule.id.clone(),
                        axis,
                        reason,
                    })?;
            }
            if !(0.0..=100.0).contains(&rule.size_percent) {
                return Err(RuleSetError::TacticalSize {
                    id: rule.id.clone(),
                    size: rule.size_percent,
                });
            }
        }
        let catch_all = rules
            .iter()
            .position(TacticalRule::is_catch_all)
            .ok_or(RuleSetError::MissingCatchAll)?;
        Ok(Self { rules, catch_all })
    }

    pub fn rules(&self) -> &[TacticalRule] {
        &self.rules
    }

    pub fn catch_all(&self) -> &TacticalRule {
        &self.rules[self.catch_all]
    }

    /// First row whose ranges contain both inputs. Never fails.
    pub fn lookup(&self, ema_distance_pct: f64, rsi_daily: f64) -> &TacticalRule {
        self.rules
            .iter()
            .find(|rule| rule.contains(ema_distance_pct, rsi_daily))
            .unwrap_or_else(|| self.catch_all())
    }

    /// Lookup from a snapshot. Missing axes resolve to the catch-all row.
    pub fn lookup_snapshot(&self, snapshot: &IndicatorSnapshot) -> &TacticalRule {
        let ema = snapshot.value(Indicator::EmaDistancePct);
        let rsi = snapshot.value(Indicator::RsiDaily);
        match (ema, rsi) {
            (Some(ema), Some(rsi)) => self.lookup(ema, rsi),
            _ => self.catch_all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defaults::builtin_tactical;

    fn matrix() -> TacticalMatrix {
        TacticalMatrix::new(builtin_tactical()).unwrap()
    }

    #[test]
    fn extreme_overbought_realizes_forty() {
        let m = matrix();
        let rule = m.lookup(25.0, 80.0);
        assert_eq!(rule.id, "realizar_extremo");
        assert_eq!(rule.action, DecisionCode::Realizar);
        assert_eq!(rule.size_percent, 40.0);
    }

    #[test]
    fn bounds_are_closed() {
        let m = matrix();
        assert_eq!(m.lookup(20.0, 70.0).id, "realizar_extremo");
        assert_eq!(m.lookup(-10.0, 30.0).id, "adicionar_capitulacao");
        assert_eq!(m.lookup(-5.0, 40.0).id, "adicionar_desconto");
    }

    #[test]
    fn neutral_zone_holds() {
        let m = matrix();
        let rule = m.lookup(0.0, 50.0);
        assert_eq!(rule.id, "hold_zona_neutra");
        assert_eq!(rule.size_percent, 0.0);
    }

    #[test]
    fn extremes_fall_through_to_catch_all() {
        let m = matrix();
        for (ema, rsi) in [(9999.0, -9999.0), (-9999.0, 9999.0)] {
            let rule = m.lookup(ema, rsi);
            assert!(rule.is_catch_all(), "({ema}, {rsi}) -> {}", rule.id);
            assert_eq!(rule.action.action(), Action::Hold);
        }
    }

    #[test]
    fn missing_axis_uses_catch_all() {
        let snap = IndicatorSnapshot::empty(chrono::Utc::now()).with(Indicator::RsiDaily, 20.0);
        assert!(matrix().lookup_snapshot(&snap).is_catch_all());
    }

    #[test]
    fn table_without_catch_all_is_rejected() {
        let mut rules = builtin_tactical();
        rules.retain(|r| !r.is_catch_all());
        assert!(matches!(
            TacticalMatrix::new(rules),
            Err(RuleSetError::MissingCatchAll)
        ));
    }

    #[test]
    fn inverted_axis_is_rejected() {
        let mut rules = builtin_tactical();
        rules[0].rsi = Range::between(100.0, 70.0);
        assert!(matches!(
            TacticalMatrix::new(rules),
            Err(RuleSetError::InvalidTacticalRange { axis: "rsi", .. })
        ));
    }
}
