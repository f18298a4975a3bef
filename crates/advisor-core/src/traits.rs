use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{AdvisorError, PriceBar};

/// Supplies ordered price bars and sparse fundamental ratios per ticker.
/// Implementations may scrape live or serve cached snapshots; the core
/// treats both identically.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn bars(&self, ticker: &str) -> Result<Vec<PriceBar>, AdvisorError>;

    async fn fundamentals(&self, ticker: &str) -> Result<BTreeMap<String, f64>, AdvisorError>;
}

/// Optional language-model collaborator. Returning `None` (unavailable or
/// declined) routes the caller onto the deterministic template path.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Option<String>;
}
