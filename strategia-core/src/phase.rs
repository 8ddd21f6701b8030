//! Market phase label derived from MVRV banding.
//!
//! The label is attached to every decision for display and grouping. It is
//! computed from `mvrv` alone, independently of which stage decided.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPhase {
    Bottom,
    Acumulacao,
    BullMedio,
    Topo,
    /// MVRV absent or non-finite.
    Indefinido,
}

impl MarketPhase {
    /// `< 1.0` bottom, `< 2.0` acumulação, `< 3.0` bull médio, otherwise topo.
    pub fn from_mvrv(mvrv: Option<f64>) -> Self {
        match mvrv {
            Some(v) if !v.is_finite() => MarketPhase::Indefinido,
            Some(v) if v < 1.0 => MarketPhase::Bottom,
            Some(v) if v < 2.0 => MarketPhase::Acumulacao,
            Some(v) if v < 3.0 => MarketPhase::BullMedio,
            Some(_) => MarketPhase::Topo,
            None => MarketPhase::Indefinido,
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            MarketPhase::Bottom => "bottom",
            MarketPhase::Acumulacao => "acumulação",
            MarketPhase::BullMedio => "bull médio",
            MarketPhase::Topo => "topo",
            MarketPhase::Indefinido => "indefinido",
        }
    }
}

impl fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges() {
        assert_eq!(MarketPhase::from_mvrv(Some(-0.5)), MarketPhase::Bottom);
        assert_eq!(MarketPhase::from_mvrv(Some(0.99)), MarketPhase::Bottom);
        assert_eq!(MarketPhase::from_mvrv(Some(1.0)), MarketPhase::Acumulacao);
        assert_eq!(MarketPhase::from_mvrv(Some(2.0)), MarketPhase::BullMedio);
        assert_eq!(MarketPhase::from_mvrv(Some(2.999)), MarketPhase::BullMedio);
        assert_eq!(MarketPhase::from_mvrv(Some(3.0)), MarketPhase::Topo);
        assert_eq!(MarketPhase::from_mvrv(Some(12.0)), MarketPhase::Topo);
    }

    #[test]
    fn missing_mvrv_is_undefined() {
        assert_eq!(MarketPhase::from_mvrv(None), MarketPhase::Indefinido);
        assert_eq!(
            MarketPhase::from_mvrv(Some(f64::NAN)),
            MarketPhase::Indefinido
        );
    }

    #[test]
    fn labels_keep_accents() {
        assert_eq!(MarketPhase::Acumulacao.to_string(), "acumulação");
        assert_eq!(MarketPhase::BullMedio.to_string(), "bull médio");
    }
}
