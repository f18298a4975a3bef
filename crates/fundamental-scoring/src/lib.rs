//! Weighted fundamental scoring over a sparse ratio set.
//!
//! Never fails: a missing ratio contributes its weight at the neutral
//! midpoint and flips `is_fallback`, so the score always spans [0, 100]
//! regardless of how degraded the input is.

use std::collections::BTreeMap;

use advisor_core::{FundamentalSummary, MetricRange, ScoringRanges};

pub const ROE: &str = "roe";
pub const PE_RATIO: &str = "pe_ratio";
pub const DEBT_TO_EQUITY: &str = "debt_to_equity";
pub const SALES_GROWTH: &str = "sales_growth_3y";
pub const PROFIT_GROWTH: &str = "profit_growth_3y";

const NEUTRAL: f64 = 50.0;

/// (metric key, weight) pairs. Weights sum to 1.0.
const WEIGHTS: [(&str, f64); 5] = [
    (ROE, 0.25),
    (PE_RATIO, 0.20),
    (DEBT_TO_EQUITY, 0.15),
    (SALES_GROWTH, 0.20),
    (PROFIT_GROWTH, 0.20),
];

fn range_for(key: &str, ranges: &ScoringRanges) -> MetricRange {
    match key {
        ROE => ranges.roe,
        PE_RATIO => ranges.pe_ratio,
        DEBT_TO_EQUITY => ranges.debt_to_equity,
        SALES_GROWTH => ranges.sales_growth,
        PROFIT_GROWTH => ranges.profit_growth,
        _ => MetricRange { low: 0.0, high: 0.0, inverse: false },
    }
}

/// Score a sparse ratio mapping for one ticker.
pub fn score(
    ticker: &str,
    metrics: &BTreeMap<String, f64>,
    ranges: &ScoringRanges,
) -> FundamentalSummary {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    let mut missing = 0usize;

    for (key, weight) in WEIGHTS {
        let sub_score = match metrics.get(key) {
            Some(&value) => range_for(key, ranges).normalize(value),
            None => {
                missing += 1;
                NEUTRAL
            }
        };
        weighted += sub_score * weight;
        total_weight += weight;
    }

    let score = (weighted / total_weight).clamp(0.0, 100.0);
    let is_fallback = missing > 0;
    if is_fallback {
        tracing::debug!(ticker, missing, "fundamental ratios missing, scoring at midpoint");
    }

    let (strengths, risks) = qualitative_flags(metrics, ranges);

    FundamentalSummary {
        ticker: ticker.to_string(),
        metrics: metrics.clone(),
        score,
        strengths,
        risks,
        is_fallback,
    }
}

/// Threshold each raw ratio into human-readable strengths and risks.
fn qualitative_flags(
    metrics: &BTreeMap<String, f64>,
    ranges: &ScoringRanges,
) -> (Vec<String>, Vec<String>) {
    let mut strengths = Vec::new();
    let mut risks = Vec::new();

    if let Some(&roe) = metrics.get(ROE) {
        if roe > ranges.roe_strength {
            strengths.push(format!(
                "ROE above {:.0}% indicates efficient capital use",
                ranges.roe_strength
            ));
        }
    }
    if let Some(&growth) = metrics.get(PROFIT_GROWTH) {
        if growth > ranges.profit_growth_strength {
            strengths.push("Profit growth trend is strong".to_string());
        }
    }
    if let Some(&pe) = metrics.get(PE_RATIO) {
        if pe < ranges.pe_strength && pe > 0.0 {
            strengths.push(format!("Valuation under {:.0}x earnings", ranges.pe_strength));
        }
    }
    if let Some(&leverage) = metrics.get(DEBT_TO_EQUITY) {
        if leverage > ranges.debt_risk {
            risks.push("High leverage could pressure cash flows".to_string());
        }
    }
    if let Some(&growth) = metrics.get(SALES_GROWTH) {
        if growth < ranges.sales_growth_risk {
            risks.push("Sales growth has been muted".to_string());
        }
    }

    (strengths, risks)
}
