//! Strategia Core — pure decision path for the strategic decision engine.
//!
//! This crate holds everything that runs without I/O:
//! - Indicator snapshots and typed ranges
//! - Protection filter gate
//! - Priority-ordered scenario matrix and tactical fallback matrix
//! - Decision-code mapping and decision synthesis with audit trail
//! - Versioned, fingerprinted rule sets (TOML)
//! - Opportunity scoring and human-readable briefings

pub mod briefing;
pub mod codes;
pub mod decision;
pub mod phase;
pub mod pipeline;
pub mod protection;
pub mod range;
pub mod ruleset;
pub mod scenario;
pub mod scoring;
pub mod snapshot;
pub mod synthesis;
pub mod tactical;

pub use codes::{Action, DecisionCode, UnknownDecisionCode};
pub use decision::{
    AuditTrail, Decision, MatrixUsed, OpportunityScores, PathTrace, RuleSetStamp, Urgency,
    AUDIT_SCHEMA_VERSION,
};
pub use phase::MarketPhase;
pub use pipeline::decide;
pub use protection::{ProtectionCheck, ProtectionConfig, ProtectionFilter, ProtectionTrigger};
pub use range::{Range, RangeError};
pub use ruleset::{RuleSet, RuleSetDocument, RuleSetError};
pub use scenario::{
    MatrixValidation, NoMatch, ScenarioConditionError, ScenarioDefinition, ScenarioGroup,
    ScenarioMatch, ScenarioMatrix,
};
pub use snapshot::{DataUnavailable, Indicator, IndicatorSnapshot};
pub use tactical::{TacticalMatrix, TacticalRule};
