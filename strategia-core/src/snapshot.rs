//! Indicator snapshot — the normalized numeric inputs for one evaluation.
//!
//! The aggregator hands the engine one `IndicatorSnapshot` per evaluation.
//! Every indicator is optional on the wire so absence is representable;
//! a non-finite value (NaN, ±inf) is treated exactly like an absent one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Names of the indicator fields a snapshot can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    MarketScore,
    RiskScore,
    Mvrv,
    Nupl,
    EmaDistancePct,
    RsiDaily,
    HealthFactor,
    LiquidationDistancePct,
    BbwPct,
    LeverageCurrent,
    LeverageAllowed,
}

impl Indicator {
    pub const ALL: [Indicator; 11] = [
        Indicator::MarketScore,
        Indicator::RiskScore,
        Indicator::Mvrv,
        Indicator::Nupl,
        Indicator::EmaDistancePct,
        Indicator::RsiDaily,
        Indicator::HealthFactor,
        Indicator::LiquidationDistancePct,
        Indicator::BbwPct,
        Indicator::LeverageCurrent,
        Indicator::LeverageAllowed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::MarketScore => "market_score",
            Indicator::RiskScore => "risk_score",
            Indicator::Mvrv => "mvrv",
            Indicator::Nupl => "nupl",
            Indicator::EmaDistancePct => "ema_distance_pct",
            Indicator::RsiDaily => "rsi_daily",
            Indicator::HealthFactor => "health_factor",
            Indicator::LiquidationDistancePct => "liquidation_distance_pct",
            Indicator::BbwPct => "bbw_pct",
            Indicator::LeverageCurrent => "leverage_current",
            Indicator::LeverageAllowed => "leverage_allowed",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A required indicator was missing or non-numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("indicator '{field}' is missing or non-numeric")]
pub struct DataUnavailable {
    pub field: Indicator,
}

/// Immutable per-evaluation input.
///
/// Created once by the aggregator and never mutated. It is not persisted on
/// its own; a verbatim copy travels inside each decision's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub market_score: Option<f64>,
    pub risk_score: Option<f64>,
    pub mvrv: Option<f64>,
    pub nupl: Option<f64>,
    pub ema_distance_pct: Option<f64>,
    pub rsi_daily: Option<f64>,
    pub health_factor: Option<f64>,
    pub liquidation_distance_pct: Option<f64>,
    pub bbw_pct: Option<f64>,
    pub leverage_current: Option<f64>,
    pub leverage_allowed: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl IndicatorSnapshot {
    /// An empty snapshot: every indicator absent.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            market_score: None,
            risk_score: None,
            mvrv: None,
            nupl: None,
            ema_distance_pct: None,
            rsi_daily: None,
            health_factor: None,
            liquidation_distance_pct: None,
            bbw_pct: None,
            leverage_current: None,
            leverage_allowed: None,
            timestamp,
        }
    }

    /// Builder-style setter, mainly for fixtures and the CLI. A non-finite
    /// value is stored as absent.
    pub fn with(mut self, field: Indicator, value: f64) -> Self {
        *self.slot_mut(field) = Some(value).filter(|v| v.is_finite());
        self
    }

    /// Builder-style removal of a field.
    pub fn without(mut self, field: Indicator) -> Self {
        *self.slot_mut(field) = None;
        self
    }

    /// Raw stored value, including non-finite numbers.
    pub fn raw(&self, field: Indicator) -> Option<f64> {
        match field {
            Indicator::MarketScore => self.market_score,
            Indicator::RiskScore => self.risk_score,
            Indicator::Mvrv => self.mvrv,
            Indicator::Nupl => self.nupl,
            Indicator::EmaDistancePct => self.ema_distance_pct,
            Indicator::RsiDaily => self.rsi_daily,
            Indicator::HealthFactor => self.health_factor,
            Indicator::LiquidationDistancePct => self.liquidation_distance_pct,
            Indicator::BbwPct => self.bbw_pct,
            Indicator::LeverageCurrent => self.leverage_current,
            Indicator::LeverageAllowed => self.leverage_allowed,
        }
    }

    /// Usable value: `None` when absent or non-finite.
    pub fn value(&self, field: Indicator) -> Option<f64> {
        self.raw(field).filter(|v| v.is_finite())
    }

    /// Usable value or a `DataUnavailable` naming the field.
    pub fn require(&self, field: Indicator) -> Result<f64, DataUnavailable> {
        self.value(field).ok_or(DataUnavailable { field })
    }

    /// Fields that are present and finite, in declaration order.
    pub fn present_fields(&self) -> Vec<Indicator> {
        Indicator::ALL
            .iter()
            .copied()
            .filter(|f| self.value(*f).is_some())
            .collect()
    }

    /// Copy with every non-finite value replaced by `None`, so the JSON form
    /// (which writes them as `null`) reads back equal.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        for field in Indicator::ALL {
            *out.slot_mut(field) = self.value(field);
        }
        out
    }

    fn slot_mut(&mut self, field: Indicator) -> &mut Option<f64> {
        match field {
            Indicator::MarketScore => &mut self.market_score,
            Indicator::RiskScore => &mut self.risk_score,
            Indicator::Mvrv => &mut self.mvrv,
            Indicator::Nupl => &mut self.nupl,
            Indicator::EmaDistancePct => &mut self.ema_distance_pct,
            Indicator::RsiDaily => &mut self.rsi_daily,
            Indicator::HealthFactor => &mut self.health_factor,
            Indicator::LiquidationDistancePct => &mut self.liquidation_distance_pct,
            Indicator::BbwPct => &mut self.bbw_pct,
            Indicator::LeverageCurrent => &mut self.leverage_current,
            Indicator::LeverageAllowed => &mut self.leverage_allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn builder_sets_and_clears_fields() {
        let snap = IndicatorSnapshot::empty(ts())
            .with(Indicator::Mvrv, 1.5)
            .with(Indicator::RsiDaily, 45.0);
        assert_eq!(snap.value(Indicator::Mvrv), Some(1.5));
        assert_eq!(snap.value(Indicator::RsiDaily), Some(45.0));

        let snap = snap.without(Indicator::Mvrv);
        assert_eq!(snap.value(Indicator::Mvrv), None);
    }

    #[test]
    fn non_finite_values_are_unavailable() {
        let snap = IndicatorSnapshot::empty(ts())
            .with(Indicator::MarketScore, f64::NAN)
            .with(Indicator::RiskScore, f64::INFINITY);
        assert_eq!(snap.raw(Indicator::MarketScore), None);
        assert_eq!(snap.value(Indicator::MarketScore), None);
        assert_eq!(
            snap.require(Indicator::RiskScore),
            Err(DataUnavailable {
                field: Indicator::RiskScore
            })
        );
    }

    #[test]
    fn normalized_clears_non_finite_fields_set_directly() {
        let mut snap = IndicatorSnapshot::empty(ts()).with(Indicator::Mvrv, 1.5);
        snap.nupl = Some(f64::NAN);
        snap.bbw_pct = Some(f64::NEG_INFINITY);

        let clean = snap.normalized();
        assert_eq!(clean.nupl, None);
        assert_eq!(clean.bbw_pct, None);
        assert_eq!(clean.mvrv, Some(1.5));
        assert_eq!(clean.timestamp, snap.timestamp);

        let json = serde_json::to_string(&clean).unwrap();
        let back: IndicatorSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, clean);
    }

    #[test]
    fn missing_fields_deserialize_as_absent() {
        let json = r#"{"market_score": 75.0, "timestamp": "2024-05-01T00:00:00Z"}"#;
        let snap: IndicatorSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.value(Indicator::MarketScore), Some(75.0));
        assert_eq!(snap.present_fields(), vec![Indicator::MarketScore]);
    }

    #[test]
    fn data_unavailable_names_the_field() {
        let err = DataUnavailable {
            field: Indicator::LeverageAllowed,
        };
        assert_eq!(
            err.to_string(),
            "indicator 'leverage_allowed' is missing or non-numeric"
        );
    }

    #[test]
    fn indicator_names_match_serde() {
        for field in Indicator::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
    }
}
