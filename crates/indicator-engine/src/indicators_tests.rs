use advisor_core::{IndicatorParams, PriceBar};
use chrono::{Duration, Utc};

use crate::frame::compute;
use crate::indicators::*;

fn sample_prices() -> Vec<f64> {
    vec![
        44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
        45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
    ]
}

fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = Utc::now() - Duration::days(closes.len() as i64);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: start + Duration::days(i as i64),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000_000.0,
        })
        .collect()
}

#[test]
fn sma_is_aligned_and_warm_up_is_none() {
    let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    let result = sma(&data, 3);

    assert_eq!(result.len(), data.len());
    assert_eq!(result[0], None);
    assert_eq!(result[1], None);
    assert!((result[2].unwrap() - 2.0).abs() < 1e-9); // (1+2+3)/3
    assert!((result[3].unwrap() - 3.0).abs() < 1e-9);
    assert!((result[4].unwrap() - 4.0).abs() < 1e-9);
}

#[test]
fn sma_insufficient_data_is_all_none() {
    let result = sma(&[1.0, 2.0], 5);
    assert!(result.iter().all(Option::is_none));
}

#[test]
fn ema_seeds_with_sma() {
    let data = vec![22.0, 24.0, 23.0, 25.0, 26.0];
    let result = ema(&data, 3);

    assert_eq!(result.len(), data.len());
    assert_eq!(result[1], None);
    let seed = (22.0 + 24.0 + 23.0) / 3.0;
    assert!((result[2].unwrap() - seed).abs() < 1e-9);

    // Recurrence: ema[3] = close*k + ema[2]*(1-k), k = 2/(3+1)
    let k = 0.5;
    let expected = 25.0 * k + seed * (1.0 - k);
    assert!((result[3].unwrap() - expected).abs() < 1e-9);
}

#[test]
fn ema_rises_in_uptrend() {
    let data: Vec<f64> = (1..=10).map(|i| i as f64).collect();
    let result = ema(&data, 3);

    let defined: Vec<f64> = result.into_iter().flatten().collect();
    for pair in defined.windows(2) {
        assert!(pair[1] > pair[0]);
    }
}

#[test]
fn rsi_warm_up_and_range() {
    let prices = sample_prices();
    let result = rsi(&prices, 14);

    assert_eq!(result.len(), prices.len());
    for value in &result[..14] {
        assert_eq!(*value, None);
    }
    for value in result.iter().flatten() {
        assert!((0.0..=100.0).contains(value));
    }
}

#[test]
fn rsi_saturates_at_100_on_monotone_rise() {
    let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let result = rsi(&prices, 14);

    // No losses at all: avg_loss stays 0, RSI is pinned to 100.
    assert_eq!(result.last().copied().flatten(), Some(100.0));
}

#[test]
fn macd_histogram_is_line_minus_signal() {
    let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
    let cols = macd(&prices, 12, 26, 9);

    assert_eq!(cols.line.len(), prices.len());
    let mut checked = 0;
    for i in 0..prices.len() {
        if let (Some(line), Some(signal), Some(hist)) = (cols.line[i], cols.signal[i], cols.hist[i]) {
            assert!((hist - (line - signal)).abs() < 1e-9);
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn macd_warm_up_before_slow_period() {
    let prices = sample_prices();
    let cols = macd(&prices, 12, 26, 9);

    // 20 bars < slow period 26: nothing is defined yet.
    assert!(cols.line.iter().all(Option::is_none));
    assert!(cols.signal.iter().all(Option::is_none));
}

#[test]
fn bollinger_band_ordering() {
    let prices = sample_prices();
    let cols = bollinger_bands(&prices, 10, 2.0);

    for i in 0..prices.len() {
        if let (Some(upper), Some(mid), Some(lower)) = (cols.upper[i], cols.mid[i], cols.lower[i]) {
            assert!(upper > mid);
            assert!(mid > lower);
        }
    }
}

#[test]
fn bollinger_bands_collapse_on_flat_series() {
    let prices = vec![100.0; 25];
    let cols = bollinger_bands(&prices, 20, 2.0);

    let upper = cols.upper.last().copied().flatten().unwrap();
    let lower = cols.lower.last().copied().flatten().unwrap();
    assert!((upper - lower).abs() < 1e-9);
}

#[test]
fn stochastic_range_and_flat_window_guard() {
    let bars = bars_from_closes(&sample_prices());
    let cols = stochastic(&bars, 14, 3);

    for value in cols.k.iter().flatten() {
        assert!((0.0..=100.0).contains(value));
    }

    let flat = bars_from_closes(&[50.0; 20]);
    let flat_cols = stochastic(&flat, 14, 3);
    assert_eq!(flat_cols.k.last().copied().flatten(), Some(50.0));
}

#[test]
fn atr_goes_to_zero_on_flat_bars() {
    let mut bars = bars_from_closes(&[100.0; 30]);
    for bar in &mut bars {
        bar.open = 100.0;
        bar.high = 100.0;
        bar.low = 100.0;
    }
    let result = atr(&bars, 14);
    assert!(result.last().copied().flatten().unwrap().abs() < 1e-9);
}

#[test]
fn atr_warm_up_is_none() {
    let bars = bars_from_closes(&sample_prices());
    let result = atr(&bars, 14);

    assert_eq!(result.len(), bars.len());
    for value in &result[..14] {
        assert_eq!(*value, None);
    }
    assert!(result[14].is_some());
}

#[test]
fn pivot_levels_find_support_and_resistance() {
    // Valley at index 5 (low 90), peak at index 12 (high 120), then settle
    // near 105 so the valley sits below the close and the peak above it.
    let closes = vec![
        100.0, 98.0, 96.0, 94.0, 92.0, 91.0, 94.0, 98.0, 104.0, 110.0, 115.0,
        118.0, 119.0, 116.0, 112.0, 108.0, 106.0, 105.0, 105.0, 105.0,
    ];
    let mut bars = bars_from_closes(&closes);
    bars[5].low = 90.0;
    bars[12].high = 120.0;

    let cols = pivot_levels(&bars, 30, 2);
    let last = bars.len() - 1;
    assert_eq!(cols.support[last], Some(90.0));
    assert_eq!(cols.resistance[last], Some(120.0));
}

#[test]
fn pivot_levels_stay_none_without_qualifying_pivot() {
    // Monotone rise: every low has a lower low before it, so no pivot low
    // forms, and no pivot high sits above the final close.
    let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
    let bars = bars_from_closes(&closes);

    let cols = pivot_levels(&bars, 30, 2);
    assert_eq!(*cols.resistance.last().unwrap(), None);
}

#[test]
fn frame_length_matches_bars_for_every_column() {
    let bars = bars_from_closes(&sample_prices());
    let frame = compute(&bars, &IndicatorParams::default()).unwrap();

    let n = bars.len();
    assert_eq!(frame.len(), n);
    assert_eq!(frame.rsi.len(), n);
    assert_eq!(frame.macd_hist.len(), n);
    assert_eq!(frame.bb_lower.len(), n);
    assert_eq!(frame.stoch_d.len(), n);
    assert_eq!(frame.atr.len(), n);
    assert_eq!(frame.support.len(), n);
}

#[test]
fn frame_errors_only_on_empty_input() {
    let err = compute(&[], &IndicatorParams::default()).unwrap_err();
    assert!(matches!(err, advisor_core::AdvisorError::InsufficientHistory(_)));

    // A single bar is fine: everything is simply not yet available.
    let bars = bars_from_closes(&[100.0]);
    let frame = compute(&bars, &IndicatorParams::default()).unwrap();
    assert_eq!(frame.len(), 1);
    assert_eq!(frame.latest().rsi, None);
}

#[test]
fn frame_is_deterministic() {
    let bars = bars_from_closes(&sample_prices());
    let params = IndicatorParams::default();

    let a = compute(&bars, &params).unwrap();
    let b = compute(&bars, &params).unwrap();
    assert_eq!(a.rsi, b.rsi);
    assert_eq!(a.macd_hist, b.macd_hist);
    assert_eq!(a.support, b.support);
}
