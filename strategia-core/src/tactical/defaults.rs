//! Built-in EMA144 distance × RSI table.

use super::TacticalRule;
use crate::codes::DecisionCode;
use crate::range::Range;

fn rule(
    id: &str,
    ema_distance: Range,
    rsi: Range,
    action: DecisionCode,
    size_percent: f64,
    justification: &str,
) -> TacticalRule {
    TacticalRule {
        id: id.to_string(),
        action,
        size_percent,
        justification: justification.to_string(),
        ema_distance,
        rsi,
    }
}

#[rustfmt::skip]
pub fn builtin_tactical() -> Vec<TacticalRule> {
    use DecisionCode::{Adicionar, Hold, Realizar};

    vec![
        // realizações
        rule("realizar_extremo", Range::at_least(20.0), Range::between(70.0, 100.0), Realizar, 40.0, "Extremo sobrecomprado"),
        rule("realizar_esticado", Range::between(15.0, 20.0), Range::between(65.0, 100.0), Realizar, 25.0, "Esticado com RSI alto"),
        rule("realizar_inicio_sobrecompra", Range::between(10.0, 15.0), Range::between(70.0, 100.0), Realizar, 15.0, "Início sobrecompra"),
        rule("realizar_moderado", Range::between(10.0, 15.0), Range::between(55.0, 65.0), Realizar, 10.0, "Moderadamente esticado"),
        // compras
        rule("adicionar_capitulacao", Range::new(None, Some(-10.0)), Range::between(0.0, 30.0), Adicionar, 75.0, "Capitulação"),
        rule("adicionar_desconto", Range::between(-10.0, -5.0), Range::between(0.0, 45.0), Adicionar, 35.0, "Desconto + oversold"),
        rule("adicionar_pullback", Range::between(-5.0, 5.0), Range::between(20.0, 40.0), Adicionar, 20.0, "Pullback saudável"),
        rule("hold_zona_neutra", Range::between(-5.0, 10.0), Range::between(40.0, 70.0), Hold, 0.0, "Zona neutra"),
        rule("hold_nao_mapeado", Range::OPEN, Range::OPEN, Hold, 0.0, "Condições não mapeadas - aguardar"),
    ]
}
