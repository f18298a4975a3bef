//! Discrete signal detection over the trailing window of an indicator
//! frame. Signals are recomputed per request and never persisted.

use advisor_core::{Direction, IndicatorFrame, PriceBar, Signal, SignalKind, SignalThresholds};

fn last_two(column: &[Option<f64>]) -> Option<(f64, f64)> {
    let n = column.len();
    if n < 2 {
        return None;
    }
    match (column[n - 2], column[n - 1]) {
        (Some(prev), Some(last)) => Some((prev, last)),
        _ => None,
    }
}

/// Highest high of the `lookback` bars preceding the last bar, and the
/// average volume over the same stretch.
fn prior_window(bars: &[PriceBar], lookback: usize) -> Option<(f64, f64)> {
    if bars.len() < lookback + 1 {
        return None;
    }
    let prior = &bars[bars.len() - 1 - lookback..bars.len() - 1];
    let prior_high = prior.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let avg_volume = prior.iter().map(|b| b.volume).sum::<f64>() / lookback as f64;
    Some((prior_high, avg_volume))
}

/// Price trigger a breakout must clear: prior high plus the configured
/// margin.
pub fn breakout_trigger(bars: &[PriceBar], thresholds: &SignalThresholds) -> Option<f64> {
    prior_window(bars, thresholds.breakout_lookback)
        .map(|(prior_high, _)| prior_high * (1.0 + thresholds.breakout_margin))
}

/// Close above the prior-window high by the configured margin, confirmed by
/// a volume surge. Strength grows with the extent of the break, saturating
/// once the close clears the prior high by 10%.
pub fn detect_breakout(bars: &[PriceBar], thresholds: &SignalThresholds) -> Option<Signal> {
    let (prior_high, avg_volume) = prior_window(bars, thresholds.breakout_lookback)?;
    let last = bars.last()?;
    let trigger = prior_high * (1.0 + thresholds.breakout_margin);

    if last.close <= trigger || avg_volume <= 0.0 {
        return None;
    }
    let volume_ratio = last.volume / avg_volume;
    if volume_ratio < thresholds.volume_surge {
        return None;
    }

    let break_pct = (last.close - prior_high) / prior_high;
    let strength = (0.5 + break_pct / 0.10 * 0.5).min(1.0);

    Some(Signal {
        kind: SignalKind::Breakout,
        direction: Direction::Bullish,
        strength,
        rationale: vec![
            format!(
                "Close {:.2} cleared the {}-bar high {:.2}",
                last.close, thresholds.breakout_lookback, prior_high
            ),
            format!("Volume ran {:.1}x its trailing average", volume_ratio),
        ],
    })
}

/// EMA stack ordering: fast > mid > slow reads bullish, the reverse reads
/// bearish. Strength comes from the fast/slow spread, saturating at a 5%
/// spread.
pub fn detect_trend(frame: &IndicatorFrame, _thresholds: &SignalThresholds) -> Option<Signal> {
    let latest = frame.latest();
    let (fast, mid, slow) = (latest.ema_fast?, latest.ema_mid?, latest.ema_slow?);
    if slow <= 0.0 {
        return None;
    }

    let direction = if fast > mid && mid > slow {
        Direction::Bullish
    } else if fast < mid && mid < slow {
        Direction::Bearish
    } else {
        return None;
    };

    let spread = (fast - slow).abs() / slow;
    let strength = (spread / 0.05).clamp(0.1, 1.0);
    let ordering = match direction {
        Direction::Bullish => "fast > mid > slow",
        Direction::Bearish => "fast < mid < slow",
    };

    Some(Signal {
        kind: SignalKind::Trend,
        direction,
        strength,
        rationale: vec![format!(
            "EMA stack {} ({:.2} / {:.2} / {:.2})",
            ordering, fast, mid, slow
        )],
    })
}

/// RSI crossing back through an extreme, confirmed by a MACD histogram sign
/// flip in the same direction on the same bar.
pub fn detect_reversal(frame: &IndicatorFrame, thresholds: &SignalThresholds) -> Option<Signal> {
    let (prev_rsi, last_rsi) = last_two(&frame.rsi)?;
    let (prev_hist, last_hist) = last_two(&frame.macd_hist)?;

    let rsi_up_cross = prev_rsi < thresholds.rsi_oversold && last_rsi >= thresholds.rsi_oversold;
    let rsi_down_cross =
        prev_rsi > thresholds.rsi_overbought && last_rsi <= thresholds.rsi_overbought;
    let hist_flip_up = prev_hist <= 0.0 && last_hist > 0.0;
    let hist_flip_down = prev_hist >= 0.0 && last_hist < 0.0;

    let direction = if rsi_up_cross && hist_flip_up {
        Direction::Bullish
    } else if rsi_down_cross && hist_flip_down {
        Direction::Bearish
    } else {
        return None;
    };

    // Conviction from the momentum of the RSI cross itself.
    let strength = ((last_rsi - prev_rsi).abs() / 10.0).clamp(0.3, 1.0);
    let (cross, threshold) = match direction {
        Direction::Bullish => ("up through oversold", thresholds.rsi_oversold),
        Direction::Bearish => ("down through overbought", thresholds.rsi_overbought),
    };

    Some(Signal {
        kind: SignalKind::Reversal,
        direction,
        strength,
        rationale: vec![
            format!("RSI crossed {} {:.0} ({:.1} -> {:.1})", cross, threshold, prev_rsi, last_rsi),
            "MACD histogram flipped sign".to_string(),
        ],
    })
}

/// Run all detectors. Order is fixed (breakout, trend, reversal) so the
/// output is deterministic for a given frame.
pub fn detect_signals(
    bars: &[PriceBar],
    frame: &IndicatorFrame,
    thresholds: &SignalThresholds,
) -> Vec<Signal> {
    let mut signals = Vec::new();
    if let Some(signal) = detect_breakout(bars, thresholds) {
        signals.push(signal);
    }
    if let Some(signal) = detect_trend(frame, thresholds) {
        signals.push(signal);
    }
    if let Some(signal) = detect_reversal(frame, thresholds) {
        signals.push(signal);
    }
    signals
}
