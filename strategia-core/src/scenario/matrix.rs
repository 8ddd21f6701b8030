//! Priority-ordered, first-match-wins scenario evaluation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::definition::{ConditionOutcome, ScenarioDefinition};
use crate::ruleset::RuleSetError;
use crate::snapshot::{Indicator, IndicatorSnapshot};

/// Why a scenario was passed over without its ranges being tested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    FieldAbsent { field: Indicator },
    ConditionError { field: Indicator, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedScenario {
    pub scenario_id: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// The first scenario whose conditions all held.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioMatch {
    pub scenario: ScenarioDefinition,
    /// Scenarios ahead of the winner that could not be evaluated.
    pub skipped: Vec<SkippedScenario>,
}

/// No scenario matched. A control value, not a failure.
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("no scenario matched the snapshot")]
pub struct NoMatch {
    pub skipped: Vec<SkippedScenario>,
}

/// Scenarios sorted by ascending priority, ties kept in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioMatrix {
    scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioMatrix {
    /// Validate and order a scenario list.
    pub fn new(scenarios: Vec<ScenarioDefinition>) -> Result<Self, RuleSetError> {
        let mut seen = HashSet::new();
        for s in &scenarios {
            if !seen.insert(s.id.as_str()) {
                return Err(RuleSetError::DuplicateScenario { id: s.id.clone() });
            }
            for (field, range) in s.conditions.iter() {
                range
                    .validate()
                    .map_err(|reason| RuleSetError::InvalidCondition {
                        scenario_id: s.id.clone(),
                        field,
                        reason,
                    })?;
            }
            if s.is_override && s.priority != 0 {
                return Err(RuleSetError::OverridePriority {
                    id: s.id.clone(),
                    priority: s.priority,
                });
            }
            if !s.is_override && s.priority == 0 {
                return Err(RuleSetError::ReservedPriority { id: s.id.clone() });
            }
            let size = s.action.resolved_size();
            if !(0.0..=100.0).contains(&size) {
                return Err(RuleSetError::ScenarioSize {
                    id: s.id.clone(),
                    size,
                });
            }
        }
        Ok(Self::from_unchecked(scenarios))
    }

    /// Order without validating. Malformed ranges surface at evaluation time
    /// as skipped scenarios.
    pub(crate) fn from_unchecked(mut scenarios: Vec<ScenarioDefinition>) -> Self {
        scenarios.sort_by_key(|s| s.priority);
        Self { scenarios }
    }

    /// Scenarios in evaluation order.
    pub fn scenarios(&self) -> &[ScenarioDefinition] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ScenarioDefinition> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Return the first scenario whose conditions all hold.
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Result<ScenarioMatch, NoMatch> {
        let mut skipped = Vec::new();

        for scenario in &self.scenarios {
            match scenario.matches(snapshot) {
                Ok(ConditionOutcome::Matched) => {
                    info!(
                        scenario = %scenario.id,
                        priority = scenario.priority,
                        is_override = scenario.is_override,
                        "scenario matched"
                    );
                    return Ok(ScenarioMatch {
                        scenario: scenario.clone(),
                        skipped,
                    });
                }
                Ok(ConditionOutcome::Failed { .. }) => {}
                Ok(ConditionOutcome::FieldAbsent { field }) => {
                    debug!(scenario = %scenario.id, %field, "scenario skipped: field absent");
                    skipped.push(SkippedScenario {
                        scenario_id: scenario.id.clone(),
                        reason: SkipReason::FieldAbsent { field },
                    });
                }
                Err(e) => {
                    warn!(scenario = %scenario.id, field = %e.field, error = %e, "scenario skipped: invalid condition");
                    skipped.push(SkippedScenario {
                        scenario_id: scenario.id.clone(),
                        reason: SkipReason::ConditionError {
                            field: e.field,
                            message: e.reason.to_string(),
                        },
                    });
                }
            }
        }

        Err(NoMatch { skipped })
    }
}
