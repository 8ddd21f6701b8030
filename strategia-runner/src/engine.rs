//! `StrategicEngine` — the full pipeline plus audit persistence.
//!
//! Rules live behind `RwLock<Arc<RuleSet>>`. An evaluation clones the `Arc`
//! once and decides against that immutable version, so `swap_rules` never
//! affects an evaluation already in flight.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use strategia_core::{
    decide, DataUnavailable, Decision, IndicatorSnapshot, MatrixValidation, ProtectionFilter,
    RuleSet, RuleSetError,
};

use crate::audit::{
    AuditStore, JsonlAuditStore, PersistenceError, PersistencePolicy, StoredDecision,
};
use crate::config::{ConfigError, EngineConfig};

/// Errors from the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    DataUnavailable(#[from] DataUnavailable),
    #[error("rule set error: {0}")]
    Rules(#[from] RuleSetError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("audit store error: {0}")]
    Store(#[from] PersistenceError),
    #[error("no decision has been recorded yet")]
    NotFound,
}

/// Whether the decision reached durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistenceOutcome {
    Recorded { id: u64 },
    /// Computed but not durably recorded.
    Failed { reason: String },
}

/// A decision together with its persistence outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub decision: Decision,
    pub persistence: PersistenceOutcome,
}

impl Evaluation {
    pub fn is_recorded(&self) -> bool {
        matches!(self.persistence, PersistenceOutcome::Recorded { .. })
    }
}

pub struct StrategicEngine {
    rules: RwLock<Arc<RuleSet>>,
    protection: ProtectionFilter,
    store: Arc<dyn AuditStore>,
    policy: PersistencePolicy,
}

impl StrategicEngine {
    pub fn new(
        rules: RuleSet,
        protection: ProtectionFilter,
        store: Arc<dyn AuditStore>,
        policy: PersistencePolicy,
    ) -> Self {
        Self {
            rules: RwLock::new(Arc::new(rules)),
            protection,
            store,
            policy,
        }
    }

    /// Build from configuration: rule set from file or built-in, JSONL audit log.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let rules = config.load_rules()?;
        let store = JsonlAuditStore::open(&config.audit.path)?;
        info!(
            rules_version = rules.version(),
            rules_hash = rules.hash(),
            audit_path = %config.audit.path.display(),
            "engine configured"
        );
        Ok(Self::new(
            rules,
            ProtectionFilter::new(config.protection.clone()),
            Arc::new(store),
            config.persistence_policy(),
        ))
    }

    /// The rule set new evaluations will use.
    pub fn rules(&self) -> Arc<RuleSet> {
        Arc::clone(&self.rules.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the rule set wholesale. Returns the previous one.
    pub fn swap_rules(&self, rules: RuleSet) -> Arc<RuleSet> {
        let next = Arc::new(rules);
        info!(version = next.version(), hash = next.hash(), "swapping rule set");
        let mut guard = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    pub fn protection(&self) -> &ProtectionFilter {
        &self.protection
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    /// Run the pure pipeline without persisting.
    pub fn decide(&self, snapshot: &IndicatorSnapshot) -> Result<Decision, EngineError> {
        let rules = self.rules();
        Ok(decide(&rules, &self.protection, snapshot, Utc::now())?)
    }

    /// Full pipeline plus persistence.
    ///
    /// A persistence failure does not fail the call: the decision is returned
    /// with `PersistenceOutcome::Failed`.
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Result<Evaluation, EngineError> {
        let decision = self.decide(snapshot)?;
        let persistence = match self.policy.record(&self.store, &decision) {
            Ok(id) => {
                info!(id, scenario = %decision.scenario_or_rule_id, "decision recorded");
                PersistenceOutcome::Recorded { id }
            }
            Err(e) => {
                error!(error = %e, scenario = %decision.scenario_or_rule_id, "decision computed but not recorded");
                PersistenceOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        Ok(Evaluation {
            decision,
            persistence,
        })
    }

    pub fn get_latest_decision(&self) -> Result<StoredDecision, EngineError> {
        self.store.latest()?.ok_or(EngineError::NotFound)
    }

    pub fn get_decision_history(&self, limit: usize) -> Result<Vec<StoredDecision>, EngineError> {
        Ok(self.store.history(limit)?)
    }

    pub fn validate_scenario_matrix(&self) -> MatrixValidation {
        self.rules().validate_scenario_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditStore;
    use strategia_core::{Indicator, MatrixUsed};

    fn engine() -> StrategicEngine {
        StrategicEngine::new(
            RuleSet::builtin(),
            ProtectionFilter::default(),
            Arc::new(InMemoryAuditStore::new()),
            PersistencePolicy::default(),
        )
    }

    fn healthy() -> IndicatorSnapshot {
        IndicatorSnapshot::empty(Utc::now())
            .with(Indicator::MarketScore, 75.0)
            .with(Indicator::RiskScore, 85.0)
            .with(Indicator::Mvrv, 1.5)
            .with(Indicator::EmaDistancePct, 0.0)
            .with(Indicator::RsiDaily, 45.0)
            .with(Indicator::LeverageCurrent, 1.0)
            .with(Indicator::LeverageAllowed, 2.0)
    }

    #[test]
    fn latest_on_empty_store_is_not_found() {
        assert!(matches!(
            engine().get_latest_decision(),
            Err(EngineError::NotFound)
        ));
    }

    #[test]
    fn data_unavailable_records_nothing() {
        let e = engine();
        let err = e.evaluate(&healthy().without(Indicator::MarketScore)).unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable(_)));
        assert!(e.get_decision_history(10).unwrap().is_empty());
    }

    #[test]
    fn decide_does_not_persist() {
        let e = engine();
        let d = e.decide(&healthy()).unwrap();
        assert_eq!(d.matrix_used, MatrixUsed::ScenarioMatrix);
        assert!(e.get_decision_history(10).unwrap().is_empty());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(PersistenceOutcome::Recorded { id: 4 }).unwrap();
        assert_eq!(json["status"], "recorded");
        assert_eq!(json["id"], 4);
    }
}
