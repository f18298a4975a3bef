//! Pure indicator math. Every function returns a column aligned with its
//! input: index i holds the indicator value at bar i, or `None` while the
//! warm-up window has not yet elapsed.

use advisor_core::PriceBar;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return out;
    }

    let mut sum: f64 = data[..period].iter().sum();
    out[period - 1] = Some(sum / period as f64);

    for i in period..data.len() {
        sum += data[i] - data[i - period];
        out[i] = Some(sum / period as f64);
    }
    out
}

/// Exponential Moving Average, seeded with the SMA of the first `period`
/// values, then `ema[i] = value[i]*k + ema[i-1]*(1-k)` with k = 2/(period+1).
pub fn ema(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = data[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(prev);

    for i in period..data.len() {
        prev = data[i] * k + prev * (1.0 - k);
        out[i] = Some(prev);
    }
    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Relative Strength Index with Wilder's smoothing. First value lands at
/// index `period` (it needs `period` price changes).
pub fn rsi(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; data.len()];
    if period == 0 || data.len() < period + 1 {
        return out;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss += change.abs();
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    for i in period + 1..data.len() {
        let change = data[i] - data[i - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, change.abs())
        };
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        out[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }
    out
}

/// MACD columns: line = EMA(fast) - EMA(slow), signal = EMA(signal_period)
/// of the line, histogram = line - signal.
pub struct MacdColumns {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub hist: Vec<Option<f64>>,
}

pub fn macd(
    data: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdColumns {
    let n = data.len();
    let mut cols = MacdColumns {
        line: vec![None; n],
        signal: vec![None; n],
        hist: vec![None; n],
    };
    if fast_period == 0 || slow_period == 0 || signal_period == 0 || slow_period < fast_period {
        return cols;
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let mut compact = Vec::new();
    for i in 0..n {
        if let (Some(f), Some(s)) = (ema_fast[i], ema_slow[i]) {
            cols.line[i] = Some(f - s);
            compact.push(f - s);
        }
    }

    // Signal line warms up over the compact (defined) stretch of the line.
    let offset = n - compact.len();
    for (j, sig) in ema(&compact, signal_period).into_iter().enumerate() {
        if let Some(sig) = sig {
            cols.signal[offset + j] = Some(sig);
            cols.hist[offset + j] = cols.line[offset + j].map(|line| line - sig);
        }
    }
    cols
}

/// Bollinger Bands around an SMA midline.
pub struct BollingerColumns {
    pub upper: Vec<Option<f64>>,
    pub mid: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn bollinger_bands(data: &[f64], period: usize, std_dev: f64) -> BollingerColumns {
    let n = data.len();
    let mut cols = BollingerColumns {
        upper: vec![None; n],
        mid: sma(data, period),
        lower: vec![None; n],
    };
    if period == 0 || n < period {
        return cols;
    }

    for i in period - 1..n {
        let Some(mean) = cols.mid[i] else { continue };
        let window = &data[i + 1 - period..=i];
        let variance =
            window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();
        cols.upper[i] = Some(mean + std_dev * std);
        cols.lower[i] = Some(mean - std_dev * std);
    }
    cols
}

/// Stochastic oscillator: %K over `k_period` highs/lows, %D = SMA(%K).
pub struct StochasticColumns {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

pub fn stochastic(bars: &[PriceBar], k_period: usize, d_period: usize) -> StochasticColumns {
    let n = bars.len();
    let mut cols = StochasticColumns {
        k: vec![None; n],
        d: vec![None; n],
    };
    if k_period == 0 || n < k_period {
        return cols;
    }

    let mut compact = Vec::new();
    for i in k_period - 1..n {
        let window = &bars[i + 1 - k_period..=i];
        let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

        let k = if highest == lowest {
            50.0
        } else {
            100.0 * (bars[i].close - lowest) / (highest - lowest)
        };
        cols.k[i] = Some(k);
        compact.push(k);
    }

    let offset = n - compact.len();
    for (j, d) in sma(&compact, d_period).into_iter().enumerate() {
        if d.is_some() {
            cols.d[offset + j] = d;
        }
    }
    cols
}

/// Average True Range with Wilder's smoothing. First value lands at index
/// `period` (true ranges need a previous close).
pub fn atr(bars: &[PriceBar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period + 1 {
        return out;
    }

    let mut true_ranges = Vec::with_capacity(bars.len() - 1);
    for i in 1..bars.len() {
        let high_low = bars[i].high - bars[i].low;
        let high_close = (bars[i].high - bars[i - 1].close).abs();
        let low_close = (bars[i].low - bars[i - 1].close).abs();
        true_ranges.push(high_low.max(high_close).max(low_close));
    }

    let mut atr_val = true_ranges[..period].iter().sum::<f64>() / period as f64;
    out[period] = Some(atr_val);

    for i in period..true_ranges.len() {
        atr_val = (atr_val * (period - 1) as f64 + true_ranges[i]) / period as f64;
        out[i + 1] = Some(atr_val);
    }
    out
}

/// Per-row support/resistance from local pivots.
pub struct PivotColumns {
    pub support: Vec<Option<f64>>,
    pub resistance: Vec<Option<f64>>,
}

/// A bar is a pivot low/high when it is the strict extreme of its symmetric
/// `neighborhood`-bar surroundings. For each row, support is the most recent
/// confirmed pivot low below that row's close within the trailing `window`;
/// resistance is the most recent confirmed pivot high above it. Rows with no
/// qualifying pivot stay `None`.
pub fn pivot_levels(bars: &[PriceBar], window: usize, neighborhood: usize) -> PivotColumns {
    let n = bars.len();
    let mut cols = PivotColumns {
        support: vec![None; n],
        resistance: vec![None; n],
    };
    if neighborhood == 0 || n < 2 * neighborhood + 1 {
        return cols;
    }

    let mut pivot_low = vec![false; n];
    let mut pivot_high = vec![false; n];
    for j in neighborhood..n - neighborhood {
        let around = &bars[j - neighborhood..=j + neighborhood];
        pivot_low[j] = around
            .iter()
            .enumerate()
            .all(|(k, b)| k == neighborhood || b.low > bars[j].low);
        pivot_high[j] = around
            .iter()
            .enumerate()
            .all(|(k, b)| k == neighborhood || b.high < bars[j].high);
    }

    for i in 0..n {
        let close = bars[i].close;
        let oldest = (i + 1).saturating_sub(window);
        // A pivot at j is only confirmed once its right neighborhood has
        // printed, i.e. j + neighborhood <= i.
        let newest = match i.checked_sub(neighborhood) {
            Some(j) => j,
            None => continue,
        };

        for j in (oldest..=newest).rev() {
            if cols.support[i].is_none() && pivot_low[j] && bars[j].low < close {
                cols.support[i] = Some(bars[j].low);
            }
            if cols.resistance[i].is_none() && pivot_high[j] && bars[j].high > close {
                cols.resistance[i] = Some(bars[j].high);
            }
            if cols.support[i].is_some() && cols.resistance[i].is_some() {
                break;
            }
        }
    }
    cols
}
