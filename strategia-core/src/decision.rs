//! The engine's sole output: one `Decision` per evaluation, plus its audit trail.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codes::{Action, DecisionCode};
use crate::phase::MarketPhase;
use crate::protection::ProtectionCheck;
use crate::scenario::{ScenarioGroup, SkippedScenario};
use crate::snapshot::IndicatorSnapshot;

/// Current version of the audit trail layout.
///
/// Bump whenever the serialized shape of [`AuditTrail`] changes, so persisted
/// decisions written by older builds stay identifiable.
pub const AUDIT_SCHEMA_VERSION: u32 = 1;

/// Which stage produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixUsed {
    Protection,
    ScenarioMatrix,
    TacticalFallback,
}

impl MatrixUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatrixUsed::Protection => "protection",
            MatrixUsed::ScenarioMatrix => "scenario_matrix",
            MatrixUsed::TacticalFallback => "tactical_fallback",
        }
    }
}

impl fmt::Display for MatrixUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative priority attached to a decision for alerting and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critica,
    Alta,
    Media,
    Baixa,
}

impl Urgency {
    /// Override or priority 0 → critica; 1 → alta; 2 → media; else baixa.
    pub fn from_priority(priority: u32, is_override: bool) -> Self {
        if is_override {
            return Urgency::Critica;
        }
        match priority {
            0 => Urgency::Critica,
            1 => Urgency::Alta,
            2 => Urgency::Media,
            _ => Urgency::Baixa,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Critica => "critica",
            Urgency::Alta => "alta",
            Urgency::Media => "media",
            Urgency::Baixa => "baixa",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the rule set a decision was produced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetStamp {
    pub version: String,
    /// BLAKE3 hash of the canonical rule-set document.
    pub hash: String,
}

/// Stage-specific intermediate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PathTrace {
    Protection {
        check: ProtectionCheck,
        threshold: f64,
        observed: f64,
    },
    Scenario {
        scenario_id: String,
        scenario_name: String,
        group: ScenarioGroup,
        priority: u32,
        is_override: bool,
        decision_code: DecisionCode,
        score_bonus: f64,
        skipped: Vec<SkippedScenario>,
    },
    Tactical {
        rule_id: String,
        decision_code: DecisionCode,
        ema_distance_pct: Option<f64>,
        rsi_daily: Option<f64>,
        skipped: Vec<SkippedScenario>,
    },
}

/// Opportunity scores computed alongside the matrices (0–100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityScores {
    pub tactical_rule_id: String,
    pub tactical_score: f64,
    pub integrated_score: f64,
}

/// Everything needed to explain or replay a decision without re-querying
/// indicator sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub schema_version: u32,
    pub ruleset: RuleSetStamp,
    pub snapshot: IndicatorSnapshot,
    pub path: PathTrace,
    pub scores: Option<OpportunityScores>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    /// Always within `[0, 100]`.
    pub size_percent: f64,
    pub scenario_or_rule_id: String,
    pub matrix_used: MatrixUsed,
    pub urgency: Urgency,
    pub justification: String,
    pub fase_mercado: MarketPhase,
    pub leverage_recommended: Option<f64>,
    pub stop_loss_percent: Option<f64>,
    pub target_description: Option<String>,
    pub audit_snapshot: AuditTrail,
    pub created_at: DateTime<Utc>,
}

impl Decision {
    /// Equality ignoring `created_at`.
    pub fn same_outcome(&self, other: &Decision) -> bool {
        self.action == other.action
            && self.size_percent.to_bits() == other.size_percent.to_bits()
            && self.scenario_or_rule_id == other.scenario_or_rule_id
            && self.matrix_used == other.matrix_used
            && self.urgency == other.urgency
            && self.justification == other.justification
            && self.fase_mercado == other.fase_mercado
            && self.leverage_recommended == other.leverage_recommended
            && self.stop_loss_percent == other.stop_loss_percent
            && self.target_description == other.target_description
            && self.audit_snapshot == other.audit_snapshot
    }

    /// The decision code behind a scenario or tactical decision.
    pub fn decision_code(&self) -> Option<DecisionCode> {
        match &self.audit_snapshot.path {
            PathTrace::Scenario { decision_code, .. } | PathTrace::Tactical { decision_code, .. } => {
                Some(*decision_code)
            }
            PathTrace::Protection { .. } => None,
        }
    }
}
