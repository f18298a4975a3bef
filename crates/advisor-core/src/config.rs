use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Strategy;

/// Indicator window lengths. Defaults follow common daily-chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub ema_fast: usize,
    pub ema_mid: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub atr_period: usize,
    /// Trailing window scanned for support/resistance pivots.
    pub pivot_window: usize,
    /// Bars on each side a pivot must dominate.
    pub pivot_neighborhood: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_fast: 20,
            ema_mid: 21,
            ema_slow: 50,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std: 2.0,
            stochastic_k: 14,
            stochastic_d: 3,
            atr_period: 14,
            pivot_window: 30,
            pivot_neighborhood: 2,
        }
    }
}

/// Signal-detection thresholds. Kept as named fields so test fixtures can
/// pin them; the numeric defaults come straight from the trading plan and
/// are pending domain-expert validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalThresholds {
    /// Prior bars whose highest high a breakout must clear.
    pub breakout_lookback: usize,
    /// Fractional margin above the prior high required to trigger.
    pub breakout_margin: f64,
    /// Volume must reach this multiple of its trailing average.
    pub volume_surge: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            breakout_lookback: 20,
            breakout_margin: 0.0,
            volume_surge: 1.5,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

/// Per-strategy weighting and trade-plan buffers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// ATR multiple for breakout/swing stops.
    pub stop_atr_multiple: f64,
    /// Tighter ATR multiple for intraday stops.
    pub day_stop_atr_multiple: f64,
    /// Breakout stop floor as a fraction of entry.
    pub breakout_stop_pct: f64,
    /// Swing entries fill slightly inside the current close.
    pub swing_pullback_pct: f64,
    /// Target = entry + risk_multiple * (entry - stop).
    pub risk_multiple: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            stop_atr_multiple: 1.5,
            day_stop_atr_multiple: 1.0,
            breakout_stop_pct: 0.10,
            swing_pullback_pct: 0.01,
            risk_multiple: 2.0,
        }
    }
}

impl StrategyConfig {
    /// (TA weight, FA weight) per strategy.
    pub fn weights(&self, strategy: Strategy) -> (f64, f64) {
        match strategy {
            Strategy::Breakout => (0.6, 0.4),
            Strategy::Swing => (0.5, 0.5),
            Strategy::Day => (0.5, 0.5),
        }
    }
}

/// Reasonable range for one raw ratio. Values are clamped into the range,
/// then mapped linearly onto [0, 100]; `inverse` flips the map for ratios
/// where lower is better (P/E, debt-to-equity).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricRange {
    pub low: f64,
    pub high: f64,
    pub inverse: bool,
}

impl MetricRange {
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.high - self.low;
        if span <= 0.0 {
            return 50.0;
        }
        let scaled = ((value - self.low) / span).clamp(0.0, 1.0) * 100.0;
        if self.inverse {
            100.0 - scaled
        } else {
            scaled
        }
    }
}

/// Normalization ranges and strength/risk cut points for the fundamental
/// scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRanges {
    pub roe: MetricRange,
    pub pe_ratio: MetricRange,
    pub debt_to_equity: MetricRange,
    pub sales_growth: MetricRange,
    pub profit_growth: MetricRange,
    pub roe_strength: f64,
    pub pe_strength: f64,
    pub profit_growth_strength: f64,
    pub debt_risk: f64,
    pub sales_growth_risk: f64,
}

impl Default for ScoringRanges {
    fn default() -> Self {
        Self {
            roe: MetricRange { low: 0.0, high: 30.0, inverse: false },
            pe_ratio: MetricRange { low: 0.0, high: 40.0, inverse: true },
            debt_to_equity: MetricRange { low: 0.0, high: 2.0, inverse: true },
            sales_growth: MetricRange { low: 0.0, high: 30.0, inverse: false },
            profit_growth: MetricRange { low: 0.0, high: 30.0, inverse: false },
            roe_strength: 18.0,
            pe_strength: 20.0,
            profit_growth_strength: 15.0,
            debt_risk: 1.0,
            sales_growth_risk: 5.0,
        }
    }
}

/// Retrieval-index tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Hits below this cosine similarity are dropped.
    pub min_similarity: f64,
    /// Optional JSON persistence location; `None` keeps the index in memory.
    pub store_path: Option<PathBuf>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_similarity: 0.1,
            store_path: None,
        }
    }
}
