//! Human-readable briefing derived from a decision.
//!
//! Computed on demand for display; never persisted.

use serde::{Deserialize, Serialize};

use crate::codes::{Action, DecisionCode};
use crate::decision::{Decision, PathTrace};

/// How soon the decision should be acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTiming {
    Immediate,
    Within24h,
    Within48h,
    Monitor,
}

impl ExecutionTiming {
    pub fn from_priority(priority: u32, is_override: bool) -> Self {
        if is_override {
            return ExecutionTiming::Immediate;
        }
        match priority {
            0 => ExecutionTiming::Immediate,
            1 => ExecutionTiming::Within24h,
            2 => ExecutionTiming::Within48h,
            _ => ExecutionTiming::Monitor,
        }
    }

    fn alert(&self) -> &'static str {
        match self {
            ExecutionTiming::Immediate => "PRIORIDADE MÁXIMA - Executar sem delay",
            ExecutionTiming::Within24h => "Alta prioridade - Executar em 24h",
            ExecutionTiming::Within48h => "Executar em até 48h",
            ExecutionTiming::Monitor => "Monitorar evolução",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Briefing {
    pub headline: String,
    pub insights: Vec<String>,
    pub alerts: Vec<String>,
    pub timing: ExecutionTiming,
}

pub fn brief(decision: &Decision) -> Briefing {
    let (headline, mut insights, timing) = match &decision.audit_snapshot.path {
        PathTrace::Protection { check, threshold, observed } => (
            format!("Filtro de proteção acionado: {check}"),
            vec![format!("Valor observado {observed:.2} contra limite {threshold:.2}")],
            ExecutionTiming::Immediate,
        ),
        PathTrace::Scenario {
            scenario_id,
            scenario_name,
            priority,
            is_override,
            ..
        } => (
            format!("Cenário identificado: {scenario_name}"),
            scenario_insights(scenario_id)
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ExecutionTiming::from_priority(*priority, *is_override),
        ),
        PathTrace::Tactical { rule_id, .. } => (
            format!("Matriz tática: {rule_id}"),
            vec!["Nenhum cenário específico atendido".to_string()],
            ExecutionTiming::from_priority(crate::synthesis::TACTICAL_PRIORITY, false),
        ),
    };

    if let Some(mvrv) = decision.audit_snapshot.snapshot.mvrv.filter(|v| v.is_finite()) {
        if mvrv < 1.0 {
            insights.push(format!("MVRV {mvrv:.1} - território historicamente barato"));
        } else if mvrv > 3.0 {
            insights.push(format!("MVRV {mvrv:.1} - território historicamente caro"));
        }
    }

    let mut alerts = Vec::new();
    if let Some(line) = action_alert(decision) {
        alerts.push(line);
    }
    if let Some(stop) = decision.stop_loss_percent {
        alerts.push(format!("Stop loss: -{stop}% do patrimônio"));
    }
    alerts.push(timing.alert().to_string());

    Briefing {
        headline,
        insights,
        alerts,
        timing,
    }
}

fn scenario_insights(id: &str) -> &'static [&'static str] {
    match id {
        "bull_inicial" => &[
            "Momento ideal para construir posição",
            "Risco controlado permite alavancagem moderada",
        ],
        "bull_maduro" => &[
            "Mercado maduro - balancear ganhos vs risco",
            "Considerar realizações parciais",
        ],
        "topo_formando" => &["Sinais de topo - priorizar proteção", "Euforia excessiva detectada"],
        "correcao_bull" => &[
            "Oportunidade de acumulação em correção",
            "Estrutura bullish permanece intacta",
        ],
        "inicio_bear" => &[
            "Estrutura bullish comprometida",
            "Priorizar preservação de capital",
        ],
        "bear_profundo" => &[
            "Oportunidade histórica de acumulação",
            "Capitulação oferece preços excepcionais",
        ],
        "risco_critico" => &["EMERGÊNCIA: Posição em risco extremo", "Ação imediata obrigatória"],
        "volatilidade_comprimida" => &[
            "Preparar para breakout iminente",
            "Paciência até direção definir",
        ],
        _ => &[],
    }
}

fn action_alert(decision: &Decision) -> Option<String> {
    let size = decision.size_percent;
    match decision.action {
        Action::EmergencyReduce => Some("EMERGÊNCIA: Reduzir posição IMEDIATAMENTE".to_string()),
        Action::Reduce if decision.decision_code().is_none() => {
            Some(format!("Reduzir {size:.0}% da posição"))
        }
        Action::Reduce => Some(format!("Realizar {size:.0}% da posição")),
        Action::Add => match (decision.decision_code(), decision.leverage_recommended) {
            (Some(DecisionCode::Entrar), Some(lev)) => {
                Some(format!("Entrar com {lev}x de alavancagem"))
            }
            _ => Some(format!("Adicionar {size:.0}% à posição")),
        },
        Action::Hold => None,
    }
}
