//! Decision history export — JSON and CSV.
//!
//! - **JSON**: full decisions with audit trails, wrapped in a versioned envelope
//! - **CSV**: the persisted flat columns, one row per decision, for spreadsheets
//!
//! JSON exports carry a `schema_version`; newer versions are rejected on import.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use strategia_core::{Decision, AUDIT_SCHEMA_VERSION};

use crate::audit::StoredDecision;

// ─── JSON export ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryExport {
    pub schema_version: u32,
    pub decisions: Vec<ExportedDecision>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedDecision {
    pub id: u64,
    #[serde(flatten)]
    pub decision: Decision,
}

pub fn export_history_json(history: &[StoredDecision]) -> Result<String> {
    let export = HistoryExport {
        schema_version: AUDIT_SCHEMA_VERSION,
        decisions: history
            .iter()
            .map(|s| ExportedDecision {
                id: s.id,
                decision: s.decision.clone(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&export).context("failed to serialize decision history to JSON")
}

pub fn import_history_json(json: &str) -> Result<Vec<StoredDecision>> {
    let export: HistoryExport =
        serde_json::from_str(json).context("failed to deserialize decision history from JSON")?;
    if export.schema_version > AUDIT_SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            export.schema_version,
            AUDIT_SCHEMA_VERSION
        );
    }
    Ok(export
        .decisions
        .into_iter()
        .map(|e| StoredDecision {
            id: e.id,
            decision: e.decision,
        })
        .collect())
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: id, created_at, score_market, score_risk, scenario_id, action,
/// size_percent, matrix_used, urgency, fase_mercado, leverage_recommended,
/// stop_loss_percent, target_description, justification
pub fn export_history_csv(history: &[StoredDecision]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "created_at",
        "score_market",
        "score_risk",
        "scenario_id",
        "action",
        "size_percent",
        "matrix_used",
        "urgency",
        "fase_mercado",
        "leverage_recommended",
        "stop_loss_percent",
        "target_description",
        "justification",
    ])?;

    for s in history {
        let d = &s.decision;
        let snap = &d.audit_snapshot.snapshot;
        wtr.write_record([
            &s.id.to_string(),
            &d.created_at.to_rfc3339(),
            &opt(snap.market_score),
            &opt(snap.risk_score),
            &d.scenario_or_rule_id,
            d.action.as_str(),
            &format!("{:.2}", d.size_percent),
            d.matrix_used.as_str(),
            d.urgency.as_str(),
            d.fase_mercado.label(),
            &opt(d.leverage_recommended),
            &opt(d.stop_loss_percent),
            d.target_description.as_deref().unwrap_or(""),
            &d.justification,
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use strategia_core::{decide, Indicator, IndicatorSnapshot, ProtectionFilter, RuleSet};

    fn history() -> Vec<StoredDecision> {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        [(1, 75.0), (2, 30.0)]
            .into_iter()
            .map(|(id, market)| {
                let snap = IndicatorSnapshot::empty(ts)
                    .with(Indicator::MarketScore, market)
                    .with(Indicator::RiskScore, 85.0)
                    .with(Indicator::Mvrv, 1.5)
                    .with(Indicator::EmaDistancePct, 0.0)
                    .with(Indicator::RsiDaily, 45.0)
                    .with(Indicator::LeverageCurrent, 1.0)
                    .with(Indicator::LeverageAllowed, 2.0);
                let decision =
                    decide(&RuleSet::builtin(), &ProtectionFilter::default(), &snap, ts).unwrap();
                StoredDecision { id, decision }
            })
            .collect()
    }

    #[test]
    fn csv_has_header_and_one_row_per_decision() {
        let csv = export_history_csv(&history()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,created_at,score_market"));
        assert!(lines[1].starts_with("1,2024-06-01T08:30:00+00:00,75.00,85.00,bull_inicial,ADD"));
        assert!(lines[2].contains("protecao_mercado"));
    }

    #[test]
    fn csv_leaves_absent_values_empty() {
        let csv = export_history_csv(&history()).unwrap();
        let mut rdr = csv::Reader::from_reader(csv.as_bytes());
        let row = rdr.records().nth(1).unwrap().unwrap();
        // Protection decisions carry no stop loss.
        assert_eq!(&row[11], "");
    }

    #[test]
    fn json_round_trip() {
        let h = history();
        let json = export_history_json(&h).unwrap();
        assert_eq!(import_history_json(&json).unwrap(), h);
    }

    #[test]
    fn json_rejects_newer_schema() {
        let json = export_history_json(&history())
            .unwrap()
            .replacen("\"schema_version\": 1", "\"schema_version\": 99", 1);
        let err = import_history_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version 99"));
    }
}
