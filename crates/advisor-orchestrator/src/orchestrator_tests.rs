use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use advisor_core::{AdvisorError, LanguageModel, MarketDataProvider, PriceBar, Strategy};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use context_assembler::DISCLAIMER;

use crate::{Advisor, AdvisorConfig};

fn rising_bars(len: usize, start: f64) -> Vec<PriceBar> {
    let now = Utc::now();
    let mut close = start;
    (0..len)
        .map(|i| {
            close *= 1.01;
            PriceBar {
                timestamp: now - Duration::days((len - i) as i64),
                open: close * 0.995,
                high: close * 1.005,
                low: close * 0.99,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect()
}

struct StaticProvider {
    bars: HashMap<String, Vec<PriceBar>>,
    fundamentals: HashMap<String, BTreeMap<String, f64>>,
    bar_calls: AtomicUsize,
}

impl StaticProvider {
    fn new() -> Self {
        Self {
            bars: HashMap::new(),
            fundamentals: HashMap::new(),
            bar_calls: AtomicUsize::new(0),
        }
    }

    fn with_ticker(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.bars.insert(ticker.to_string(), bars);
        self
    }

    fn with_fundamentals(mut self, ticker: &str, metrics: &[(&str, f64)]) -> Self {
        let map = metrics
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        self.fundamentals.insert(ticker.to_string(), map);
        self
    }
}

#[async_trait]
impl MarketDataProvider for StaticProvider {
    async fn bars(&self, ticker: &str) -> Result<Vec<PriceBar>, AdvisorError> {
        self.bar_calls.fetch_add(1, Ordering::SeqCst);
        self.bars
            .get(ticker)
            .cloned()
            .ok_or_else(|| AdvisorError::Provider(format!("no data feed for {ticker}")))
    }

    async fn fundamentals(&self, ticker: &str) -> Result<BTreeMap<String, f64>, AdvisorError> {
        Ok(self.fundamentals.get(ticker).cloned().unwrap_or_default())
    }
}

struct CannedModel(Option<String>);

#[async_trait]
impl LanguageModel for CannedModel {
    async fn generate(&self, _prompt: &str) -> Option<String> {
        self.0.clone()
    }
}

fn advisor_with(provider: StaticProvider) -> Arc<Advisor> {
    Arc::new(Advisor::new(
        Arc::new(provider),
        None,
        None,
        AdvisorConfig::default(),
    ))
}

#[tokio::test]
async fn screen_isolates_per_ticker_failures() {
    let provider = StaticProvider::new().with_ticker("GOOD", rising_bars(60, 100.0));
    let advisor = advisor_with(provider);

    let universe = vec!["GOOD".to_string(), "DEAD".to_string()];
    let report = advisor.screen(Strategy::Breakout, &universe).await;

    assert_eq!(report.scores.len(), 1);
    assert_eq!(report.scores[0].ticker, "GOOD");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].ticker, "DEAD");
    assert!(report.skipped[0].reason.contains("no data feed"));
}

#[tokio::test]
async fn screen_orders_scores_non_increasing() {
    let provider = StaticProvider::new()
        .with_ticker("AAA", rising_bars(60, 100.0))
        .with_ticker("BBB", rising_bars(60, 40.0))
        .with_ticker("CCC", rising_bars(60, 250.0))
        .with_fundamentals("AAA", &[("roe", 25.0), ("debt_to_equity", 0.3)]);
    let advisor = advisor_with(provider);

    let universe: Vec<String> = ["AAA", "BBB", "CCC"].map(String::from).to_vec();
    let report = advisor.screen(Strategy::Swing, &universe).await;

    assert_eq!(report.scores.len(), 3);
    assert!(report.skipped.is_empty());
    assert!(report
        .scores
        .windows(2)
        .all(|pair| pair[0].score >= pair[1].score));
}

#[tokio::test]
async fn history_frame_stays_aligned_with_bars() {
    let provider = StaticProvider::new().with_ticker("ACME", rising_bars(45, 80.0));
    let advisor = advisor_with(provider);

    let history = advisor.history("ACME").await.unwrap();

    assert_eq!(history.bars.len(), 45);
    assert_eq!(history.frame.len(), 45);
    assert!(history.frame.latest().rsi.is_some());
}

#[tokio::test]
async fn history_on_unknown_ticker_is_an_error() {
    let advisor = advisor_with(StaticProvider::new());
    let err = advisor.history("NOPE").await.unwrap_err();
    assert!(matches!(err, AdvisorError::Provider(_)));
}

#[tokio::test]
async fn repeat_requests_hit_the_bars_cache() {
    let provider = Arc::new(StaticProvider::new().with_ticker("ACME", rising_bars(45, 80.0)));
    let advisor = Advisor::new(provider.clone(), None, None, AdvisorConfig::default());

    advisor.history("ACME").await.unwrap();
    advisor.history("ACME").await.unwrap();

    assert_eq!(provider.bar_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn chat_without_model_or_notes_still_answers() {
    let provider = StaticProvider::new().with_ticker("ACME", rising_bars(60, 100.0));
    let advisor = advisor_with(provider);

    let answer = advisor.chat("ACME", "what do you think?").await;

    assert!(answer.contains("ACME"));
    assert!(answer.contains(DISCLAIMER));
}

#[tokio::test]
async fn chat_with_no_history_degrades_to_fundamentals_only() {
    let advisor = advisor_with(StaticProvider::new());

    let answer = advisor.chat("GHOST", "how are the fundamentals?").await;

    assert!(answer.contains("scored neutral"));
    assert!(answer.contains(DISCLAIMER));
}

#[tokio::test]
async fn chat_prefers_the_language_model_when_it_answers() {
    let provider = StaticProvider::new().with_ticker("ACME", rising_bars(60, 100.0));
    let advisor = Arc::new(Advisor::new(
        Arc::new(provider),
        Some(Arc::new(CannedModel(Some("model speaks".to_string())))),
        None,
        AdvisorConfig::default(),
    ));

    let answer = advisor.chat("ACME", "what do you think?").await;
    assert_eq!(answer, "model speaks");
}

#[tokio::test]
async fn declined_model_falls_back_to_the_template() {
    let provider = StaticProvider::new().with_ticker("ACME", rising_bars(60, 100.0));
    let advisor = Arc::new(Advisor::new(
        Arc::new(provider),
        Some(Arc::new(CannedModel(None))),
        None,
        AdvisorConfig::default(),
    ));

    let answer = advisor.chat("ACME", "what do you think?").await;
    assert!(answer.contains(DISCLAIMER));
}

#[tokio::test]
async fn fresh_advisor_starts_with_seeded_grounding() {
    let provider = StaticProvider::new().with_ticker("ACME", rising_bars(60, 100.0));
    let advisor = advisor_with(provider);
    assert!(!advisor.index().is_empty());

    let answer = advisor.chat("ACME", "what about breakout volume?").await;
    assert!(answer.contains("Breakout entries want strong volume expansion"));
}

#[tokio::test]
async fn ingested_notes_surface_in_chat_grounding() {
    let provider = StaticProvider::new().with_ticker("ACME", rising_bars(60, 100.0));
    let advisor = advisor_with(provider);

    let written = advisor
        .ingest_notes(
            &["Volume expansion confirms breakout entries".to_string()],
            "playbook",
        )
        .unwrap();
    assert_eq!(written, 1);

    let answer = advisor.chat("ACME", "is the breakout real?").await;
    assert!(answer.contains("Volume expansion confirms breakout entries"));
}

#[tokio::test]
async fn blank_notes_are_skipped() {
    let advisor = advisor_with(StaticProvider::new());
    let seeded = advisor.index().len();

    let written = advisor
        .ingest_notes(&["  ".to_string(), "real note".to_string()], "playbook")
        .unwrap();
    assert_eq!(written, 1);
    assert_eq!(advisor.index().len(), seeded + 1);
}
