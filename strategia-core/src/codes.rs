//! Canonical actions and the decision-code mapping table.
//!
//! Rule tables speak in heterogeneous decision codes (`ENTRAR`,
//! `REALIZAR_PARCIAL`, `EMERGENCIA_REDUZIR`, ...). Every code maps to exactly
//! one canonical `Action` through the exhaustive match in
//! [`DecisionCode::action`]; a code outside the closed set fails when the rule
//! table is parsed, never later as a silent HOLD.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four canonical position actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Add,
    Reduce,
    Hold,
    EmergencyReduce,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "ADD",
            Action::Reduce => "REDUCE",
            Action::Hold => "HOLD",
            Action::EmergencyReduce => "EMERGENCY_REDUCE",
        }
    }

    /// True for both reduction flavours.
    pub fn is_reduction(&self) -> bool {
        matches!(self, Action::Reduce | Action::EmergencyReduce)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision codes as they appear in scenario and tactical tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionCode {
    Entrar,
    Adicionar,
    AdicionarAgressivo,
    AcumularHistorico,
    AcumularSpotApenas,
    Realizar,
    RealizarParcial,
    RealizarAgressivo,
    ReduzirDefensivo,
    EmergenciaReduzir,
    PrepararBreakout,
    HoldNeutro,
    Hold,
}

/// A code string outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown decision code '{0}'")]
pub struct UnknownDecisionCode(pub String);

impl DecisionCode {
    pub const ALL: [DecisionCode; 13] = [
        DecisionCode::Entrar,
        DecisionCode::Adicionar,
        DecisionCode::AdicionarAgressivo,
        DecisionCode::AcumularHistorico,
        DecisionCode::AcumularSpotApenas,
        DecisionCode::Realizar,
        DecisionCode::RealizarParcial,
        DecisionCode::RealizarAgressivo,
        DecisionCode::ReduzirDefensivo,
        DecisionCode::EmergenciaReduzir,
        DecisionCode::PrepararBreakout,
        DecisionCode::HoldNeutro,
        DecisionCode::Hold,
    ];

    /// The mapping table: code → (canonical action, default size %).
    ///
    /// The default size applies when a scenario leaves `size_percent` unset.
    fn mapping(self) -> (Action, f64) {
        match self {
            DecisionCode::Entrar => (Action::Add, 40.0),
            DecisionCode::Adicionar => (Action::Add, 35.0),
            DecisionCode::AdicionarAgressivo => (Action::Add, 40.0),
            DecisionCode::AcumularHistorico => (Action::Add, 75.0),
            DecisionCode::AcumularSpotApenas => (Action::Add, 75.0),
            DecisionCode::Realizar => (Action::Reduce, 30.0),
            DecisionCode::RealizarParcial => (Action::Reduce, 30.0),
            DecisionCode::RealizarAgressivo => (Action::Reduce, 30.0),
            DecisionCode::ReduzirDefensivo => (Action::Reduce, 70.0),
            DecisionCode::EmergenciaReduzir => (Action::EmergencyReduce, 70.0),
            DecisionCode::PrepararBreakout => (Action::Hold, 0.0),
            DecisionCode::HoldNeutro => (Action::Hold, 0.0),
            DecisionCode::Hold => (Action::Hold, 0.0),
        }
    }

    pub fn action(self) -> Action {
        self.mapping().0
    }

    pub fn default_size_percent(self) -> f64 {
        self.mapping().1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionCode::Entrar => "ENTRAR",
            DecisionCode::Adicionar => "ADICIONAR",
            DecisionCode::AdicionarAgressivo => "ADICIONAR_AGRESSIVO",
            DecisionCode::AcumularHistorico => "ACUMULAR_HISTORICO",
            DecisionCode::AcumularSpotApenas => "ACUMULAR_SPOT_APENAS",
            DecisionCode::Realizar => "REALIZAR",
            DecisionCode::RealizarParcial => "REALIZAR_PARCIAL",
            DecisionCode::RealizarAgressivo => "REALIZAR_AGRESSIVO",
            DecisionCode::ReduzirDefensivo => "REDUZIR_DEFENSIVO",
            DecisionCode::EmergenciaReduzir => "EMERGENCIA_REDUZIR",
            DecisionCode::PrepararBreakout => "PREPARAR_BREAKOUT",
            DecisionCode::HoldNeutro => "HOLD_NEUTRO",
            DecisionCode::Hold => "HOLD",
        }
    }
}

impl FromStr for DecisionCode {
    type Err = UnknownDecisionCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecisionCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownDecisionCode(s.to_string()))
    }
}

impl fmt::Display for DecisionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
