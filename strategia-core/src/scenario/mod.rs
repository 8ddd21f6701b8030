//! Scenario matrix: named multi-condition market regimes, evaluated in
//! priority order with strict first-match-wins.
//!
//! Priority 0 is reserved for override scenarios (emergencies). A scenario
//! that references an indicator the snapshot lacks cannot match; it is skipped
//! and recorded so the audit trail shows why it was not considered.

mod definition;
mod matrix;
mod validation;

pub mod defaults;

pub use definition::{
    ConditionOutcome, Conditions, ScenarioAction, ScenarioConditionError, ScenarioDefinition,
    ScenarioGroup,
};
pub use matrix::{NoMatch, ScenarioMatch, ScenarioMatrix, SkipReason, SkippedScenario};
pub use validation::MatrixValidation;
