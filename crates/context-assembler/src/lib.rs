//! Grounded context assembly for chat turns.
//!
//! `build` collects structured facts and retrieval snippets into a
//! [`ChatContext`]; `render_prompt` turns it into the language-model
//! prompt, and `render_answer` produces the deterministic templated answer
//! used when no model is configured or the model declines. The template
//! path is a first-class mode, not an error state: it never fails and only
//! states facts it was handed.

use advisor_core::{
    ChatContext, FundamentalSummary, IndicatorSnapshot, SearchHit, StrategyScore, StructuredFacts,
};

pub const DISCLAIMER: &str =
    "Educational analysis only; not investment advice. Verify before acting.";

/// Assemble a chat context. Always succeeds; absent pieces simply render
/// as unavailable.
pub fn build(
    ticker: &str,
    question: &str,
    last_close: Option<f64>,
    indicators: IndicatorSnapshot,
    strategy: Option<StrategyScore>,
    fundamentals: FundamentalSummary,
    grounding: Vec<SearchHit>,
) -> ChatContext {
    ChatContext {
        ticker: ticker.to_string(),
        question: question.to_string(),
        facts: StructuredFacts {
            last_close,
            indicators,
            strategy,
            fundamentals,
        },
        grounding,
        disclaimer: DISCLAIMER.to_string(),
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}

fn push_fact_lines(out: &mut String, ctx: &ChatContext) {
    let facts = &ctx.facts;
    let ind = &facts.indicators;

    out.push_str(&format!("Ticker: {}\n", ctx.ticker));
    out.push_str(&format!("Last close: {}\n", fmt_opt(facts.last_close)));
    out.push_str(&format!(
        "Indicators: RSI {} | MACD hist {} | ATR {} | EMA {}/{}/{}\n",
        fmt_opt(ind.rsi),
        fmt_opt(ind.macd_hist),
        fmt_opt(ind.atr),
        fmt_opt(ind.ema_fast),
        fmt_opt(ind.ema_mid),
        fmt_opt(ind.ema_slow),
    ));
    out.push_str(&format!(
        "Support / Resistance: {} / {}\n",
        fmt_opt(ind.support),
        fmt_opt(ind.resistance),
    ));

    if let Some(strategy) = &facts.strategy {
        out.push_str(&format!(
            "Strategy: {} (score {:.1}/100)\n",
            strategy.strategy, strategy.score
        ));
        out.push_str(&format!(
            "Entry / Stop / Target: {:.2} / {:.2} / {:.2}\n",
            strategy.entry, strategy.stop, strategy.target
        ));
        for reason in &strategy.reasons {
            out.push_str(&format!("  - {reason}\n"));
        }
    }

    let fund = &facts.fundamentals;
    out.push_str(&format!(
        "Fundamental score: {:.1}/100{}\n",
        fund.score,
        if fund.is_fallback { " (incomplete data)" } else { "" }
    ));
    for (key, value) in &fund.metrics {
        out.push_str(&format!("  - {key}: {value:.2}\n"));
    }
    for strength in &fund.strengths {
        out.push_str(&format!("  + {strength}\n"));
    }
    for risk in &fund.risks {
        out.push_str(&format!("  ! {risk}\n"));
    }
}

/// Render the prompt handed to the language model. Fixed section order:
/// question, structured facts, grounding snippets, disclaimer.
pub fn render_prompt(ctx: &ChatContext) -> String {
    let mut out = String::new();
    out.push_str(
        "You are an educational trading assistant. Answer using ONLY the \
         facts and context below; state any limitation explicitly.\n\n",
    );
    out.push_str(&format!("Question: {}\n\n", ctx.question));

    out.push_str("Facts:\n");
    push_fact_lines(&mut out, ctx);

    out.push_str("\nRetrieved context:\n");
    if ctx.grounding.is_empty() {
        out.push_str("- none\n");
    }
    for hit in &ctx.grounding {
        out.push_str(&format!(
            "- {} (source: {}, similarity {:.2})\n",
            hit.document.text, hit.document.source, hit.similarity
        ));
    }

    out.push_str(&format!("\n{}\n", ctx.disclaimer));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuestionIntent {
    Fundamentals,
    Levels,
    General,
}

fn classify(question: &str) -> QuestionIntent {
    let q = question.to_lowercase();
    if ["fundamental", "valuation", "pe ratio", "profit", "debt"]
        .iter()
        .any(|k| q.contains(k))
    {
        QuestionIntent::Fundamentals
    } else if ["support", "resistance", "level", "target", "stop", "entry"]
        .iter()
        .any(|k| q.contains(k))
    {
        QuestionIntent::Levels
    } else {
        QuestionIntent::General
    }
}

/// Deterministic templated answer built purely from the structured facts.
pub fn render_answer(ctx: &ChatContext) -> String {
    let mut out = match classify(&ctx.question) {
        QuestionIntent::Fundamentals => render_fundamentals(ctx),
        QuestionIntent::Levels => render_levels(ctx),
        QuestionIntent::General => render_general(ctx),
    };

    if !ctx.grounding.is_empty() {
        out.push_str("\nRelated notes:\n");
        for hit in &ctx.grounding {
            out.push_str(&format!("- {}\n", hit.document.text));
        }
    }
    out.push_str(&format!("\n{}", ctx.disclaimer));
    out
}

fn render_fundamentals(ctx: &ChatContext) -> String {
    let fund = &ctx.facts.fundamentals;
    let mut out = format!("Fundamental snapshot for {}:\n\n", ctx.ticker);

    out.push_str("| Metric | Value |\n| --- | --- |\n");
    if fund.metrics.is_empty() {
        out.push_str("| (no ratios available) | - |\n");
    }
    for (key, value) in &fund.metrics {
        out.push_str(&format!("| {key} | {value:.2} |\n"));
    }

    out.push_str(&format!("\nOverall score: {:.1}/100", fund.score));
    if fund.is_fallback {
        out.push_str(" (some ratios missing, scored neutral)");
    }
    out.push('\n');
    if !fund.strengths.is_empty() {
        out.push_str(&format!("Strengths: {}\n", fund.strengths.join("; ")));
    }
    if !fund.risks.is_empty() {
        out.push_str(&format!("Risks: {}\n", fund.risks.join("; ")));
    }
    out
}

fn render_levels(ctx: &ChatContext) -> String {
    let ind = &ctx.facts.indicators;
    let mut out = format!("Key levels for {}:\n", ctx.ticker);
    out.push_str(&format!(
        "- Support: {} | Resistance: {}\n",
        fmt_opt(ind.support),
        fmt_opt(ind.resistance)
    ));

    match &ctx.facts.strategy {
        Some(strategy) => {
            out.push_str(&format!(
                "- {} setup: entry {:.2}, stop {:.2}, target {:.2} (score {:.1}/100)\n",
                strategy.strategy, strategy.entry, strategy.stop, strategy.target, strategy.score
            ));
            if let Some(reason) = strategy.reasons.first() {
                out.push_str(&format!("- Rationale: {reason}\n"));
            }
        }
        None => out.push_str("- No strategy setup is available right now.\n"),
    }
    out
}

fn render_general(ctx: &ChatContext) -> String {
    let mut out = format!("Analysis summary for {}:\n\n", ctx.ticker);
    push_fact_lines(&mut out, ctx);
    out
}
