use advisor_core::{
    IndicatorParams, RetrievalConfig, ScoringRanges, SignalThresholds, StrategyConfig,
};

/// Full advisor configuration: one bundle of the explicit, named config
/// structures the components consume.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub indicators: IndicatorParams,
    pub thresholds: SignalThresholds,
    pub strategy: StrategyConfig,
    pub scoring: ScoringRanges,
    pub retrieval: RetrievalConfig,
    /// How long cached per-ticker data stays fresh.
    pub cache_ttl_secs: i64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorParams::default(),
            thresholds: SignalThresholds::default(),
            strategy: StrategyConfig::default(),
            scoring: ScoringRanges::default(),
            retrieval: RetrievalConfig::default(),
            cache_ttl_secs: 300,
        }
    }
}

impl AdvisorConfig {
    /// Defaults with environment overrides (reads `.env` when present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Ok(path) = std::env::var("ADVISOR_RAG_STORE") {
            config.retrieval.store_path = Some(path.into());
        }
        if let Some(top_k) = env_parse("ADVISOR_RAG_TOP_K") {
            config.retrieval.top_k = top_k;
        }
        if let Some(ttl) = env_parse("ADVISOR_CACHE_TTL_SECS") {
            config.cache_ttl_secs = ttl;
        }
        if let Some(surge) = env_parse("ADVISOR_VOLUME_SURGE") {
            config.thresholds.volume_surge = surge;
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}
