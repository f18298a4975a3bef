//! Per-strategy scoring and the deterministic cross-ticker ordering.

use std::cmp::Ordering;

use advisor_core::{
    AdvisorError, FundamentalSummary, IndicatorFrame, PriceBar, Signal, SignalKind,
    SignalThresholds, Strategy, StrategyConfig, StrategyScore,
};

use crate::signals::breakout_trigger;

/// TA conviction when no signal fired at all.
const BASELINE_STRENGTH: f64 = 0.4;
/// Bonus for a breakout signal feeding the breakout strategy.
const AFFINITY_BONUS: f64 = 0.1;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pick the dominant signal for a strategy: highest strength wins, with a
/// small affinity bonus when a breakout signal feeds the breakout strategy.
fn dominant_strength(strategy: Strategy, signals: &[Signal]) -> (f64, Vec<String>) {
    if signals.is_empty() {
        return (BASELINE_STRENGTH, Vec::new());
    }

    let effective = |signal: &Signal| {
        let bonus = if strategy == Strategy::Breakout && signal.kind == SignalKind::Breakout {
            AFFINITY_BONUS
        } else {
            0.0
        };
        (signal.strength + bonus).min(1.0)
    };

    let mut ordered: Vec<&Signal> = signals.iter().collect();
    ordered.sort_by(|a, b| {
        effective(b)
            .partial_cmp(&effective(a))
            .unwrap_or(Ordering::Equal)
    });

    let strength = effective(ordered[0]);
    let rationale = ordered
        .iter()
        .flat_map(|signal| signal.rationale.iter().cloned())
        .collect();
    (strength, rationale)
}

/// Score one (ticker, strategy) pair and propose an entry/stop/target plan.
///
/// Pure function of its inputs: re-running on identical inputs yields an
/// identical score.
#[allow(clippy::too_many_arguments)]
pub fn rank(
    ticker: &str,
    frame: &IndicatorFrame,
    bars: &[PriceBar],
    signals: &[Signal],
    fundamentals: &FundamentalSummary,
    strategy: Strategy,
    config: &StrategyConfig,
    thresholds: &SignalThresholds,
) -> Result<StrategyScore, AdvisorError> {
    let last = bars.last().ok_or_else(|| {
        AdvisorError::InsufficientHistory(format!("no bars for {ticker}"))
    })?;
    let close = last.close;
    // Fallback volatility proxy when ATR has not warmed up yet.
    let atr = frame.latest().atr.unwrap_or(close * 0.02);

    let (signal_strength, signal_rationale) = dominant_strength(strategy, signals);
    let ta_score = signal_strength * 100.0;
    let fa_score = fundamentals.score;
    let (ta_weight, fa_weight) = config.weights(strategy);
    let score = (ta_score * ta_weight + fa_score * fa_weight).clamp(0.0, 100.0);

    let breakout_fired = signals.iter().any(|s| s.kind == SignalKind::Breakout);
    let (entry, stop) = match strategy {
        Strategy::Breakout => {
            let entry = if breakout_fired {
                breakout_trigger(bars, thresholds).unwrap_or(close)
            } else {
                close
            };
            let buffer = (config.stop_atr_multiple * atr).max(config.breakout_stop_pct * entry);
            (entry, entry - buffer)
        }
        Strategy::Swing => {
            let entry = close * (1.0 - config.swing_pullback_pct);
            (entry, entry - config.stop_atr_multiple * atr)
        }
        Strategy::Day => (close, close - config.day_stop_atr_multiple * atr),
    };
    let target = entry + config.risk_multiple * (entry - stop);

    let mut reasons = Vec::new();
    reasons.push(format!("TA score {ta_score:.1}/100, FA score {fa_score:.1}/100"));
    reasons.extend(signal_rationale);
    for strength in fundamentals.strengths.iter().take(2) {
        reasons.push(format!("Strength: {strength}"));
    }
    for risk in fundamentals.risks.iter().take(1) {
        reasons.push(format!("Watch: {risk}"));
    }
    if fundamentals.is_fallback {
        reasons.push("Fundamental data incomplete, missing ratios scored neutral".to_string());
    }

    Ok(StrategyScore {
        ticker: ticker.to_string(),
        strategy,
        score: round2(score),
        entry: round2(entry),
        stop: round2(stop),
        target: round2(target),
        signal_strength,
        reasons,
    })
}

/// Order scores for one strategy across tickers: score descending, ties by
/// higher signal strength, then alphabetical ticker for determinism.
pub fn rank_universe(mut scores: Vec<StrategyScore>) -> Vec<StrategyScore> {
    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.signal_strength
                    .partial_cmp(&a.signal_strength)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    scores
}
