//! Completeness report for a scenario table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::definition::{ScenarioDefinition, ScenarioGroup};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixValidation {
    pub total_scenarios: usize,
    /// Every group is listed, including empty ones.
    pub counts_by_group: BTreeMap<ScenarioGroup, usize>,
    pub expected_total: usize,
    pub complete: bool,
}

impl MatrixValidation {
    pub fn of(scenarios: &[ScenarioDefinition], expected_total: usize) -> Self {
        let mut counts_by_group: BTreeMap<ScenarioGroup, usize> =
            ScenarioGroup::ALL.iter().map(|g| (*g, 0)).collect();
        for s in scenarios {
            *counts_by_group.entry(s.group).or_default() += 1;
        }
        let total_scenarios = scenarios.len();
        Self {
            total_scenarios,
            counts_by_group,
            expected_total,
            complete: total_scenarios == expected_total,
        }
    }
}
