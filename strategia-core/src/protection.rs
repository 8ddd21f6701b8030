//! Protection filter stage: the hard safety gate evaluated before any matrix.
//!
//! Three ordered checks, first one that fires wins:
//! 1. market score below its floor
//! 2. risk score below its floor
//! 3. current leverage above the allowed leverage
//!
//! All four inputs are required. A missing or non-finite value aborts the
//! evaluation with [`DataUnavailable`] rather than letting the gate pass by
//! accident.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::{DataUnavailable, Indicator, IndicatorSnapshot};

/// Floors and reduction sizes for the protection gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionConfig {
    /// Market score strictly below this fires the first check.
    #[serde(default = "default_market_floor")]
    pub market_floor: f64,
    /// Risk score strictly below this fires the second check.
    #[serde(default = "default_risk_floor")]
    pub risk_floor: f64,
    #[serde(default = "default_market_reduce_percent")]
    pub market_reduce_percent: f64,
    #[serde(default = "default_risk_reduce_percent")]
    pub risk_reduce_percent: f64,
}

fn default_market_floor() -> f64 {
    40.0
}

fn default_risk_floor() -> f64 {
    50.0
}

fn default_market_reduce_percent() -> f64 {
    50.0
}

fn default_risk_reduce_percent() -> f64 {
    70.0
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            market_floor: default_market_floor(),
            risk_floor: default_risk_floor(),
            market_reduce_percent: default_market_reduce_percent(),
            risk_reduce_percent: default_risk_reduce_percent(),
        }
    }
}

/// Which protection check fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionCheck {
    MarketScore,
    RiskScore,
    Leverage,
}

impl ProtectionCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionCheck::MarketScore => "market_score",
            ProtectionCheck::RiskScore => "risk_score",
            ProtectionCheck::Leverage => "leverage",
        }
    }

    /// Stable identifier used as `scenario_or_rule_id` on protection decisions.
    pub fn rule_id(&self) -> &'static str {
        match self {
            ProtectionCheck::MarketScore => "protecao_mercado",
            ProtectionCheck::RiskScore => "protecao_risco",
            ProtectionCheck::Leverage => "protecao_alavancagem",
        }
    }
}

impl fmt::Display for ProtectionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fired protection check, ready for synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectionTrigger {
    pub check: ProtectionCheck,
    pub size_percent: f64,
    /// The floor (score checks) or the allowed leverage (leverage check).
    pub threshold: f64,
    /// The snapshot value compared against `threshold`.
    pub observed: f64,
    pub justification: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProtectionFilter {
    config: ProtectionConfig,
}

impl ProtectionFilter {
    pub fn new(config: ProtectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    /// Run the three checks in order.
    ///
    /// Returns `Ok(None)` when every check passes.
    pub fn check(
        &self,
        snapshot: &IndicatorSnapshot,
    ) -> Result<Option<ProtectionTrigger>, DataUnavailable> {
        let market = snapshot.require(Indicator::MarketScore)?;
        let risk = snapshot.require(Indicator::RiskScore)?;
        let leverage_current = snapshot.require(Indicator::LeverageCurrent)?;
        let leverage_allowed = snapshot.require(Indicator::LeverageAllowed)?;

        let floor = self.config.market_floor;
        if market < floor {
            return Ok(Some(ProtectionTrigger {
                check: ProtectionCheck::MarketScore,
                size_percent: self.config.market_reduce_percent,
                threshold: floor,
                observed: market,
                justification: format!("Score mercado {market:.1} abaixo do limite {floor:.1}"),
            }));
        }

        let floor = self.config.risk_floor;
        if risk < floor {
            return Ok(Some(ProtectionTrigger {
                check: ProtectionCheck::RiskScore,
                size_percent: self.config.risk_reduce_percent,
                threshold: floor,
                observed: risk,
                justification: format!("Score risco {risk:.1} abaixo do limite {floor:.1}"),
            }));
        }

        if leverage_current > leverage_allowed {
            let excess = leverage_current - leverage_allowed;
            return Ok(Some(ProtectionTrigger {
                check: ProtectionCheck::Leverage,
                size_percent: leverage_reduction_percent(leverage_current, leverage_allowed),
                threshold: leverage_allowed,
                observed: leverage_current,
                justification: format!(
                    "Alavancagem {leverage_current:.2}x excede permitido \
                     {leverage_allowed:.2}x em {excess:.2}x"
                ),
            }));
        }

        Ok(None)
    }
}

/// Share of the position to cut so that leverage returns to the allowed level.
///
/// `clip((current - allowed) / current * 100, 0, 100)`; a non-positive current
/// leverage yields 0.
pub fn leverage_reduction_percent(current: f64, allowed: f64) -> f64 {
    if current <= 0.0 {
        return 0.0;
    }
    ((current - allowed) / current * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn healthy() -> IndicatorSnapshot {
        IndicatorSnapshot::empty(Utc::now())
            .with(Indicator::MarketScore, 75.0)
            .with(Indicator::RiskScore, 85.0)
            .with(Indicator::LeverageCurrent, 1.0)
            .with(Indicator::LeverageAllowed, 2.0)
    }

    #[test]
    fn healthy_snapshot_passes() {
        let filter = ProtectionFilter::default();
        assert_eq!(filter.check(&healthy()).unwrap(), None);
    }

    #[test]
    fn market_floor_fires_first() {
        let snap = healthy()
            .with(Indicator::MarketScore, 35.0)
            .with(Indicator::RiskScore, 10.0);
        let trigger = ProtectionFilter::default().check(&snap).unwrap().unwrap();
        assert_eq!(trigger.check, ProtectionCheck::MarketScore);
        assert_eq!(trigger.size_percent, 50.0);
        assert_eq!(trigger.justification, "Score mercado 35.0 abaixo do limite 40.0");
    }

    #[test]
    fn market_floor_is_strict() {
        let snap = healthy().with(Indicator::MarketScore, 40.0);
        assert_eq!(ProtectionFilter::default().check(&snap).unwrap(), None);
    }

    #[test]
    fn risk_floor_reduces_seventy() {
        let snap = healthy().with(Indicator::RiskScore, 42.5);
        let trigger = ProtectionFilter::default().check(&snap).unwrap().unwrap();
        assert_eq!(trigger.check, ProtectionCheck::RiskScore);
        assert_eq!(trigger.size_percent, 70.0);
        assert_eq!(trigger.observed, 42.5);
        assert!(trigger.justification.contains("42.5"));
    }

    #[test]
    fn leverage_excess_sizes_reduction() {
        let snap = healthy()
            .with(Indicator::LeverageCurrent, 3.0)
            .with(Indicator::LeverageAllowed, 2.0);
        let trigger = ProtectionFilter::default().check(&snap).unwrap().unwrap();
        assert_eq!(trigger.check, ProtectionCheck::Leverage);
        assert!((trigger.size_percent - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            trigger.justification,
            "Alavancagem 3.00x excede permitido 2.00x em 1.00x"
        );
    }

    #[test]
    fn equal_leverage_does_not_fire() {
        let snap = healthy()
            .with(Indicator::LeverageCurrent, 2.0)
            .with(Indicator::LeverageAllowed, 2.0);
        assert_eq!(ProtectionFilter::default().check(&snap).unwrap(), None);
    }

    #[test]
    fn missing_field_is_fatal_and_named() {
        let snap = healthy().without(Indicator::LeverageAllowed);
        let err = ProtectionFilter::default().check(&snap).unwrap_err();
        assert_eq!(err.field, Indicator::LeverageAllowed);

        let snap = healthy().with(Indicator::RiskScore, f64::NAN);
        let err = ProtectionFilter::default().check(&snap).unwrap_err();
        assert_eq!(err.field, Indicator::RiskScore);
    }

    #[test]
    fn reduction_percent_is_clipped() {
        assert_eq!(leverage_reduction_percent(0.0, 2.0), 0.0);
        assert_eq!(leverage_reduction_percent(1.0, 2.0), 0.0);
        assert_eq!(leverage_reduction_percent(2.0, -1.0), 100.0);
        assert_eq!(leverage_reduction_percent(4.0, 2.0), 50.0);
    }

    #[test]
    fn config_defaults_fill_missing_keys() {
        let cfg: ProtectionConfig = toml::from_str("market_floor = 45.0").unwrap();
        assert_eq!(cfg.market_floor, 45.0);
        assert_eq!(cfg.risk_floor, 50.0);
        assert_eq!(cfg.risk_reduce_percent, 70.0);
    }
}
