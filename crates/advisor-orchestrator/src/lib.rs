//! Top-level advisor facade: wires the market-data provider, indicator and
//! strategy engines, fundamental scoring, the retrieval index, and the
//! optional language model behind four operations — `screen`, `history`,
//! `chat`, and `ingest_notes`.

pub mod config;

#[cfg(test)]
mod orchestrator_tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use advisor_core::{
    AdvisorError, FundamentalSummary, IndicatorFrame, LanguageModel, MarketDataProvider, PriceBar,
    Strategy, StrategyScore,
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use retrieval_index::{EmbeddingModel, RetrievalIndex};
use serde::Serialize;
use tokio::task::JoinSet;

pub use config::AdvisorConfig;

/// Ranked screen over a ticker universe. Tickers that failed evaluation are
/// listed in `skipped` with the reason; they never abort the batch.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenReport {
    pub strategy: Strategy,
    pub scores: Vec<StrategyScore>,
    pub skipped: Vec<SkippedTicker>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
}

/// Price history with its aligned indicator frame, one frame row per bar.
#[derive(Debug, Clone, Serialize)]
pub struct TickerHistory {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
    pub frame: IndicatorFrame,
}

struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

impl<T: Clone> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn fresh(&self, ttl: Duration) -> Option<T> {
        (Utc::now() - self.cached_at < ttl).then(|| self.data.clone())
    }
}

pub struct Advisor {
    provider: Arc<dyn MarketDataProvider>,
    llm: Option<Arc<dyn LanguageModel>>,
    index: RetrievalIndex,
    config: AdvisorConfig,
    bars_cache: DashMap<String, CacheEntry<Vec<PriceBar>>>,
    fundamentals_cache: DashMap<String, CacheEntry<FundamentalSummary>>,
}

impl Advisor {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        llm: Option<Arc<dyn LanguageModel>>,
        embedder: Option<Arc<dyn EmbeddingModel>>,
        config: AdvisorConfig,
    ) -> Self {
        let index = RetrievalIndex::open(config.retrieval.clone(), embedder);
        // A fresh (or recovered-from-corruption) index starts with the
        // default strategy-notes corpus so chat grounding is never empty.
        if let Err(err) = index.bootstrap() {
            tracing::warn!(error = %err, "failed to seed the retrieval index");
        }
        Self {
            provider,
            llm,
            index,
            config,
            bars_cache: DashMap::new(),
            fundamentals_cache: DashMap::new(),
        }
    }

    pub fn index(&self) -> &RetrievalIndex {
        &self.index
    }

    fn cache_ttl(&self) -> Duration {
        Duration::seconds(self.config.cache_ttl_secs)
    }

    async fn cached_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, AdvisorError> {
        if let Some(entry) = self.bars_cache.get(ticker) {
            if let Some(bars) = entry.fresh(self.cache_ttl()) {
                tracing::debug!(ticker, "bars cache hit");
                return Ok(bars);
            }
        }

        let bars = self.provider.bars(ticker).await?;
        self.bars_cache
            .insert(ticker.to_string(), CacheEntry::new(bars.clone()));
        Ok(bars)
    }

    /// Fundamental summary for a ticker. Provider failure degrades to an
    /// empty ratio set scored at the neutral midpoint, never an error.
    async fn cached_fundamentals(&self, ticker: &str) -> FundamentalSummary {
        if let Some(entry) = self.fundamentals_cache.get(ticker) {
            if let Some(summary) = entry.fresh(self.cache_ttl()) {
                return summary;
            }
        }

        let metrics = match self.provider.fundamentals(ticker).await {
            Ok(metrics) => metrics,
            Err(err) => {
                tracing::warn!(ticker, error = %err, "fundamentals unavailable, scoring neutral");
                BTreeMap::new()
            }
        };
        let summary = fundamental_scoring::score(ticker, &metrics, &self.config.scoring);
        self.fundamentals_cache
            .insert(ticker.to_string(), CacheEntry::new(summary.clone()));
        summary
    }

    /// Full per-ticker evaluation for one strategy.
    pub async fn evaluate(
        &self,
        ticker: &str,
        strategy: Strategy,
    ) -> Result<StrategyScore, AdvisorError> {
        let bars = self.cached_bars(ticker).await?;
        let frame = indicator_engine::compute(&bars, &self.config.indicators)?;
        let signals = strategy_engine::detect_signals(&bars, &frame, &self.config.thresholds);
        let fundamentals = self.cached_fundamentals(ticker).await;
        strategy_engine::rank(
            ticker,
            &frame,
            &bars,
            &signals,
            &fundamentals,
            strategy,
            &self.config.strategy,
            &self.config.thresholds,
        )
    }

    /// Evaluate every ticker concurrently and rank the survivors. A failing
    /// ticker is logged and recorded in `skipped`; the batch always returns.
    pub async fn screen(self: &Arc<Self>, strategy: Strategy, universe: &[String]) -> ScreenReport {
        let mut tasks = JoinSet::new();
        for ticker in universe {
            let advisor = Arc::clone(self);
            let ticker = ticker.clone();
            tasks.spawn(async move {
                let result = advisor.evaluate(&ticker, strategy).await;
                (ticker, result)
            });
        }

        let mut scores = Vec::new();
        let mut skipped = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(score))) => scores.push(score),
                Ok((ticker, Err(err))) => {
                    tracing::warn!(ticker, error = %err, "ticker skipped during screen");
                    skipped.push(SkippedTicker {
                        ticker,
                        reason: err.to_string(),
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "screen task failed to join");
                }
            }
        }

        skipped.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        ScreenReport {
            strategy,
            scores: strategy_engine::rank_universe(scores),
            skipped,
            generated_at: Utc::now(),
        }
    }

    /// Price bars plus the aligned indicator frame for charting.
    pub async fn history(&self, ticker: &str) -> Result<TickerHistory, AdvisorError> {
        let bars = self.cached_bars(ticker).await?;
        let frame = indicator_engine::compute(&bars, &self.config.indicators)?;
        Ok(TickerHistory {
            ticker: ticker.to_string(),
            bars,
            frame,
        })
    }

    /// Answer a question about a ticker. Tries the language model when one
    /// is configured; otherwise, or when the model declines, falls back to
    /// the deterministic template. Never fails outward: data problems shrink
    /// the fact set instead of erroring.
    pub async fn chat(&self, ticker: &str, question: &str) -> String {
        let bars = match self.cached_bars(ticker).await {
            Ok(bars) => bars,
            Err(err) => {
                tracing::warn!(ticker, error = %err, "no price history for chat");
                Vec::new()
            }
        };

        let frame = indicator_engine::compute(&bars, &self.config.indicators).unwrap_or_default();
        let fundamentals = self.cached_fundamentals(ticker).await;
        let strategy = self.best_strategy(ticker, &bars, &frame, &fundamentals);
        let grounding = self.index.search(question, self.config.retrieval.top_k);

        let context = context_assembler::build(
            ticker,
            question,
            bars.last().map(|b| b.close),
            frame.latest(),
            strategy,
            fundamentals,
            grounding,
        );

        if let Some(llm) = &self.llm {
            let prompt = context_assembler::render_prompt(&context);
            if let Some(text) = llm.generate(&prompt).await {
                let text = text.trim();
                if !text.is_empty() {
                    return text.to_string();
                }
            }
            tracing::info!(ticker, "language model declined, using template answer");
        }

        context_assembler::render_answer(&context)
    }

    fn best_strategy(
        &self,
        ticker: &str,
        bars: &[PriceBar],
        frame: &IndicatorFrame,
        fundamentals: &FundamentalSummary,
    ) -> Option<StrategyScore> {
        if bars.is_empty() {
            return None;
        }
        let signals = strategy_engine::detect_signals(bars, frame, &self.config.thresholds);
        let scores: Vec<StrategyScore> = [Strategy::Breakout, Strategy::Swing, Strategy::Day]
            .into_iter()
            .filter_map(|strategy| {
                strategy_engine::rank(
                    ticker,
                    frame,
                    bars,
                    &signals,
                    fundamentals,
                    strategy,
                    &self.config.strategy,
                    &self.config.thresholds,
                )
                .ok()
            })
            .collect();
        strategy_engine::rank_universe(scores).into_iter().next()
    }

    /// Index free-form notes for later retrieval. Returns the number of
    /// documents written.
    pub fn ingest_notes(&self, notes: &[String], source: &str) -> Result<usize, AdvisorError> {
        let now = Utc::now();
        let stamp = now.timestamp_millis();
        let mut written = 0;
        for (i, text) in notes.iter().enumerate() {
            if text.trim().is_empty() {
                continue;
            }
            self.index.upsert(advisor_core::RetrievalDocument {
                id: format!("{source}-{stamp}-{i}"),
                text: text.trim().to_string(),
                source: source.to_string(),
                created_at: now,
            })?;
            written += 1;
        }
        tracing::info!(source, written, "notes ingested");
        Ok(written)
    }
}
