//! Persisted record shape: flat columns plus the verbatim audit blob.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strategia_core::{
    Action, AuditTrail, Decision, MarketPhase, MatrixUsed, Urgency, AUDIT_SCHEMA_VERSION,
};

use super::{PersistenceError, StoredDecision};

/// One row of the decision log.
///
/// The flat columns exist for querying and export; `audit_json` is the
/// authoritative, schema-versioned copy of the snapshot and intermediate
/// values and is stored byte-for-byte as serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: u64,
    pub score_market: Option<f64>,
    pub score_risk: Option<f64>,
    pub scenario_id: String,
    pub action: Action,
    pub size_percent: f64,
    pub justification: String,
    pub urgency: Urgency,
    pub matrix_used: MatrixUsed,
    pub fase_mercado: MarketPhase,
    pub leverage_recommended: Option<f64>,
    pub stop_loss_percent: Option<f64>,
    pub target_description: Option<String>,
    pub audit_json: String,
    pub created_at: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn from_decision(id: u64, decision: &Decision) -> Result<Self, serde_json::Error> {
        let audit_json = serde_json::to_string(&decision.audit_snapshot)?;
        let snapshot = &decision.audit_snapshot.snapshot;
        Ok(Self {
            id,
            score_market: snapshot.market_score,
            score_risk: snapshot.risk_score,
            scenario_id: decision.scenario_or_rule_id.clone(),
            action: decision.action,
            size_percent: decision.size_percent,
            justification: decision.justification.clone(),
            urgency: decision.urgency,
            matrix_used: decision.matrix_used,
            fase_mercado: decision.fase_mercado,
            leverage_recommended: decision.leverage_recommended,
            stop_loss_percent: decision.stop_loss_percent,
            target_description: decision.target_description.clone(),
            audit_json,
            created_at: decision.created_at,
        })
    }

    /// Schema version declared inside `audit_json`.
    pub fn schema_version(&self) -> Result<u32, PersistenceError> {
        let value: serde_json::Value =
            serde_json::from_str(&self.audit_json).map_err(|e| self.corrupt(e))?;
        let found = value
            .get("schema_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| self.corrupt("missing schema_version"))?;
        Ok(u32::try_from(found).unwrap_or(u32::MAX))
    }

    /// Rebuild the decision, rejecting audit blobs newer than this build.
    pub fn into_stored(self) -> Result<StoredDecision, PersistenceError> {
        let found = self.schema_version()?;
        if found > AUDIT_SCHEMA_VERSION {
            return Err(PersistenceError::UnsupportedSchema {
                id: self.id,
                found,
                supported: AUDIT_SCHEMA_VERSION,
            });
        }
        let audit: AuditTrail =
            serde_json::from_str(&self.audit_json).map_err(|e| self.corrupt(e))?;

        Ok(StoredDecision {
            id: self.id,
            decision: Decision {
                action: self.action,
                size_percent: self.size_percent,
                scenario_or_rule_id: self.scenario_id,
                matrix_used: self.matrix_used,
                urgency: self.urgency,
                justification: self.justification,
                fase_mercado: self.fase_mercado,
                leverage_recommended: self.leverage_recommended,
                stop_loss_percent: self.stop_loss_percent,
                target_description: self.target_description,
                audit_snapshot: audit,
                created_at: self.created_at,
            },
        })
    }

    fn corrupt(&self, reason: impl ToString) -> PersistenceError {
        PersistenceError::Corrupt {
            id: self.id,
            reason: reason.to_string(),
        }
    }
}
