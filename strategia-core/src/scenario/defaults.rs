//! Built-in production scenario table.

use super::definition::{Conditions, ScenarioAction, ScenarioDefinition, ScenarioGroup};
use crate::codes::DecisionCode;
use crate::range::Range;

pub const BUILTIN_EXPECTED_SCENARIOS: usize = 8;

struct Spec {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    group: ScenarioGroup,
    priority: u32,
    score_bonus: f64,
    conditions: Conditions,
    decision: DecisionCode,
    size_percent: Option<f64>,
    leverage: f64,
    stop_loss: f64,
    target: &'static str,
    justification: &'static str,
}

impl Spec {
    fn build(self) -> ScenarioDefinition {
        ScenarioDefinition {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            group: self.group,
            priority: self.priority,
            is_override: self.priority == 0,
            score_bonus: self.score_bonus,
            conditions: self.conditions,
            action: ScenarioAction {
                decision: self.decision,
                size_percent: self.size_percent,
                leverage_recommended: Some(self.leverage),
                stop_loss_percent: Some(self.stop_loss),
                target_description: Some(self.target.to_string()),
                justification: self.justification.to_string(),
            },
        }
    }
}

/// The eight production scenarios in declaration order.
pub fn builtin_scenarios() -> Vec<ScenarioDefinition> {
    vec![
        Spec {
            id: "bull_inicial",
            name: "Bull Market Inicial",
            description: "Bitcoin saindo de acumulação",
            group: ScenarioGroup::Bull,
            priority: 1,
            score_bonus: 20.0,
            conditions: Conditions {
                market_score: Some(Range::at_least(70.0)),
                risk_score: Some(Range::at_least(80.0)),
                mvrv: Some(Range::between(1.0, 2.0)),
                ema_distance_pct: Some(Range::between(-5.0, 10.0)),
                rsi_daily: Some(Range::between(35.0, 55.0)),
                ..Default::default()
            },
            decision: DecisionCode::Entrar,
            size_percent: None,
            leverage: 2.0,
            stop_loss: 12.0,
            target: "Aguardar EMA +15%",
            justification: "Estrutura bullish se formando com risco controlado",
        },
        Spec {
            id: "bull_maduro",
            name: "Bull Market Maduro",
            description: "Tendência estabelecida há meses",
            group: ScenarioGroup::Bull,
            priority: 2,
            score_bonus: 15.0,
            conditions: Conditions {
                market_score: Some(Range::at_least(65.0)),
                risk_score: Some(Range::at_least(70.0)),
                mvrv: Some(Range::between(2.0, 3.0)),
                ema_distance_pct: Some(Range::between(10.0, 20.0)),
                rsi_daily: Some(Range::between(60.0, 75.0)),
                ..Default::default()
            },
            decision: DecisionCode::RealizarParcial,
            size_percent: Some(25.0),
            leverage: 1.5,
            stop_loss: 10.0,
            target: "Preparar mais realizações",
            justification: "Mercado maduro - proteção de lucros",
        },
        Spec {
            id: "topo_formando",
            name: "Topo Formando",
            description: "Euforia de mercado - sinais de topo",
            group: ScenarioGroup::Bull,
            priority: 1,
            score_bonus: 25.0,
            conditions: Conditions {
                market_score: Some(Range::at_least(60.0)),
                risk_score: Some(Range::at_least(65.0)),
                mvrv: Some(Range::at_least(3.0)),
                ema_distance_pct: Some(Range::at_least(20.0)),
                rsi_daily: Some(Range::between(75.0, 100.0)),
                ..Default::default()
            },
            decision: DecisionCode::RealizarAgressivo,
            size_percent: Some(50.0),
            leverage: 1.0,
            stop_loss: 8.0,
            target: "Reduzir para 1.0-1.5x max",
            justification: "Sinais de topo - proteção urgente",
        },
        Spec {
            id: "correcao_bull",
            name: "Correção em Bull",
            description: "Pullback saudável em tendência bullish",
            group: ScenarioGroup::Bull,
            priority: 1,
            score_bonus: 22.0,
            conditions: Conditions {
                market_score: Some(Range::at_least(60.0)),
                risk_score: Some(Range::at_least(75.0)),
                mvrv: Some(Range::between(1.5, 3.0)),
                ema_distance_pct: Some(Range::between(-15.0, -5.0)),
                rsi_daily: Some(Range::between(30.0, 50.0)),
                ..Default::default()
            },
            decision: DecisionCode::AdicionarAgressivo,
            size_percent: Some(40.0),
            leverage: 2.0,
            stop_loss: 10.0,
            target: "DCA em 3 dias",
            justification: "Correção saudável - oportunidade",
        },
        Spec {
            id: "inicio_bear",
            name: "Início Bear Market",
            description: "Quebra de estrutura bullish",
            group: ScenarioGroup::Bear,
            priority: 2,
            score_bonus: -10.0,
            conditions: Conditions {
                market_score: Some(Range::between(0.0, 38.0)),
                risk_score: Some(Range::at_least(65.0)),
                mvrv: Some(Range::between(1.5, 3.0)),
                ema_distance_pct: Some(Range::between(-15.0, 5.0)),
                rsi_daily: Some(Range::between(25.0, 45.0)),
                ..Default::default()
            },
            decision: DecisionCode::ReduzirDefensivo,
            size_percent: Some(50.0),
            leverage: 0.5,
            stop_loss: 15.0,
            target: "Preservação capital",
            justification: "Estrutura quebrada - modo defensivo",
        },
        Spec {
            id: "bear_profundo",
            name: "Bear Market Profundo",
            description: "Capitulação geral - oportunidade histórica",
            group: ScenarioGroup::Bear,
            priority: 1,
            score_bonus: 30.0,
            conditions: Conditions {
                market_score: Some(Range::between(0.0, 25.0)),
                risk_score: Some(Range::below(45.0)),
                mvrv: Some(Range::between(0.0, 1.5)),
                ema_distance_pct: Some(Range::below(-15.0)),
                rsi_daily: Some(Range::between(15.0, 35.0)),
                ..Default::default()
            },
            decision: DecisionCode::AcumularHistorico,
            size_percent: Some(75.0),
            leverage: 1.5,
            stop_loss: 20.0,
            target: "Aguardar Score > 60",
            justification: "Oportunidade histórica de acumulação",
        },
        Spec {
            id: "risco_critico",
            name: "Risco Crítico",
            description: "Posição em perigo - override obrigatório",
            group: ScenarioGroup::Emergency,
            priority: 0,
            score_bonus: -50.0,
            conditions: Conditions {
                health_factor: Some(Range::below(1.3)),
                liquidation_distance_pct: Some(Range::below(25.0)),
                ..Default::default()
            },
            decision: DecisionCode::EmergenciaReduzir,
            size_percent: Some(80.0),
            leverage: 0.2,
            stop_loss: 5.0,
            target: "Salvar capital",
            justification: "EMERGÊNCIA: Posição em risco crítico",
        },
        Spec {
            id: "volatilidade_comprimida",
            name: "Volatilidade Comprimida",
            description: "Mercado lateral - breakout iminente",
            group: ScenarioGroup::Neutral,
            priority: 3,
            score_bonus: 5.0,
            conditions: Conditions {
                market_score: Some(Range::between(50.0, 65.0)),
                risk_score: Some(Range::at_least(70.0)),
                bbw_pct: Some(Range::below(8.0)),
                rsi_daily: Some(Range::between(45.0, 55.0)),
                ema_distance_pct: Some(Range::between(-5.0, 5.0)),
                ..Default::default()
            },
            decision: DecisionCode::PrepararBreakout,
            size_percent: Some(0.0),
            leverage: 1.2,
            stop_loss: 8.0,
            target: "50% dry powder",
            justification: "Compressão - preparar para movimento",
        },
    ]
    .into_iter()
    .map(Spec::build)
    .collect()
}
