//! Opportunity scores (0–100) recorded alongside each matrix decision.
//!
//! Informational only: they never change which stage decides or the action.

use crate::codes::Action;

/// Score of the tactical row on its own.
///
/// Base by action (add `70 + 0.3·size`, reduce `60 + 0.2·size`, hold `50`),
/// plus context bonuses when EMA distance or RSI sit at an extreme that
/// supports the action.
pub fn tactical_score(
    action: Action,
    size_percent: f64,
    ema_distance_pct: Option<f64>,
    rsi_daily: Option<f64>,
) -> f64 {
    let score = match action {
        Action::Add => {
            let mut s = 70.0 + size_percent * 0.3;
            if rsi_daily.is_some_and(|r| r < 30.0) {
                s += 10.0;
            }
            if ema_distance_pct.is_some_and(|e| e < -15.0) {
                s += 10.0;
            }
            s
        }
        Action::Reduce | Action::EmergencyReduce => {
            let mut s = 60.0 + size_percent * 0.2;
            if rsi_daily.is_some_and(|r| r > 70.0) {
                s += 10.0;
            }
            if ema_distance_pct.is_some_and(|e| e > 20.0) {
                s += 10.0;
            }
            s
        }
        Action::Hold => 50.0,
    };
    score.clamp(0.0, 100.0)
}

/// `0.4·tactical + 0.3·market + 0.3·risk + bonus`, clamped to `[0, 100]`.
pub fn integrated_score(tactical: f64, market_score: f64, risk_score: f64, score_bonus: f64) -> f64 {
    (tactical * 0.4 + market_score * 0.3 + risk_score * 0.3 + score_bonus).clamp(0.0, 100.0)
}
