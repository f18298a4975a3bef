use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar. Produced by the data-acquisition collaborator, ordered
/// ascending by timestamp with no duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Derived indicator columns, one entry per input bar. Rows inside an
/// indicator's warm-up window are `None`, never a fabricated number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorFrame {
    pub ema_fast: Vec<Option<f64>>,
    pub ema_mid: Vec<Option<f64>>,
    pub ema_slow: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd_line: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_hist: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_mid: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
    pub stoch_k: Vec<Option<f64>>,
    pub stoch_d: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
    pub support: Vec<Option<f64>>,
    pub resistance: Vec<Option<f64>>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.ema_fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ema_fast.is_empty()
    }

    /// Values at the most recent bar, for signal detection and chat facts.
    pub fn latest(&self) -> IndicatorSnapshot {
        fn last(column: &[Option<f64>]) -> Option<f64> {
            column.last().copied().flatten()
        }

        IndicatorSnapshot {
            ema_fast: last(&self.ema_fast),
            ema_mid: last(&self.ema_mid),
            ema_slow: last(&self.ema_slow),
            rsi: last(&self.rsi),
            macd_line: last(&self.macd_line),
            macd_signal: last(&self.macd_signal),
            macd_hist: last(&self.macd_hist),
            bb_upper: last(&self.bb_upper),
            bb_mid: last(&self.bb_mid),
            bb_lower: last(&self.bb_lower),
            stoch_k: last(&self.stoch_k),
            stoch_d: last(&self.stoch_d),
            atr: last(&self.atr),
            support: last(&self.support),
            resistance: last(&self.resistance),
        }
    }
}

/// Latest-row excerpt of an [`IndicatorFrame`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub ema_fast: Option<f64>,
    pub ema_mid: Option<f64>,
    pub ema_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_lower: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub atr: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    Breakout,
    Trend,
    Reversal,
}

impl SignalKind {
    pub fn label(&self) -> &'static str {
        match self {
            SignalKind::Breakout => "breakout",
            SignalKind::Trend => "trend",
            SignalKind::Reversal => "reversal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

/// Discrete trading signal derived from the indicator frame. Recomputed on
/// each request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub direction: Direction,
    /// Signal conviction in [0, 1].
    pub strength: f64,
    pub rationale: Vec<String>,
}

/// Scored fundamentals for one ticker. `is_fallback` marks a degraded ratio
/// set (one or more metrics missing, scored at the neutral midpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalSummary {
    pub ticker: String,
    pub metrics: BTreeMap<String, f64>,
    /// Weighted score in [0, 100].
    pub score: f64,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub is_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Breakout,
    Swing,
    Day,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Breakout => "breakout",
            Strategy::Swing => "swing",
            Strategy::Day => "day",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "breakout" => Ok(Strategy::Breakout),
            "swing" => Ok(Strategy::Swing),
            "day" | "intraday" => Ok(Strategy::Day),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// One (ticker, strategy) evaluation with a trade plan. Ephemeral —
/// recomputed per screen request and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyScore {
    pub ticker: String,
    pub strategy: Strategy,
    /// Combined TA/FA score in [0, 100].
    pub score: f64,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    /// Strength of the dominant signal, kept for deterministic tie-breaks.
    pub signal_strength: f64,
    pub reasons: Vec<String>,
}

/// Text document held by the retrieval index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalDocument {
    pub id: String,
    pub text: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// A retrieved document with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: RetrievalDocument,
    pub similarity: f64,
}

/// Numeric facts handed to the context assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredFacts {
    pub last_close: Option<f64>,
    pub indicators: IndicatorSnapshot,
    pub strategy: Option<StrategyScore>,
    pub fundamentals: FundamentalSummary,
}

/// Grounded context for one chat turn. Built fresh per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatContext {
    pub ticker: String,
    pub question: String,
    pub facts: StructuredFacts,
    pub grounding: Vec<SearchHit>,
    pub disclaimer: String,
}
