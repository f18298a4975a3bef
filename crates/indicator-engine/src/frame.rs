use advisor_core::{AdvisorError, IndicatorFrame, IndicatorParams, PriceBar};

use crate::indicators::{atr, bollinger_bands, ema, macd, pivot_levels, rsi, stochastic};

/// Compute the full indicator frame for an ordered bar sequence.
///
/// Deterministic pure function of (bars, params): identical inputs always
/// produce identical frames, so results can be cached by (ticker,
/// date-range, params). Errors only on an empty sequence; short sequences
/// degrade to `None`-filled warm-up rows.
pub fn compute(bars: &[PriceBar], params: &IndicatorParams) -> Result<IndicatorFrame, AdvisorError> {
    if bars.is_empty() {
        return Err(AdvisorError::InsufficientHistory(
            "no price bars supplied".to_string(),
        ));
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let macd_cols = macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal);
    let bb = bollinger_bands(&closes, params.bollinger_period, params.bollinger_std);
    let stoch = stochastic(bars, params.stochastic_k, params.stochastic_d);
    let pivots = pivot_levels(bars, params.pivot_window, params.pivot_neighborhood);

    Ok(IndicatorFrame {
        ema_fast: ema(&closes, params.ema_fast),
        ema_mid: ema(&closes, params.ema_mid),
        ema_slow: ema(&closes, params.ema_slow),
        rsi: rsi(&closes, params.rsi_period),
        macd_line: macd_cols.line,
        macd_signal: macd_cols.signal,
        macd_hist: macd_cols.hist,
        bb_upper: bb.upper,
        bb_mid: bb.mid,
        bb_lower: bb.lower,
        stoch_k: stoch.k,
        stoch_d: stoch.d,
        atr: atr(bars, params.atr_period),
        support: pivots.support,
        resistance: pivots.resistance,
    })
}
