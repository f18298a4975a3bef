//! Append-only document index with cosine search and JSON persistence.
//!
//! Single-writer discipline: `upsert` and `rebuild` take the write lock,
//! `search` reads a consistent snapshot. The persisted store is rebuildable
//! state, never authoritative data — corruption logs and yields an empty
//! index instead of an error.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::sync::{Arc, RwLock};

use advisor_core::{AdvisorError, RetrievalConfig, RetrievalDocument, SearchHit};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::embedder::{dense_cosine, sparse_cosine, term_vector, EmbeddingModel};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    document: RetrievalDocument,
    /// Dense embedding when the model produced one.
    dense: Option<Vec<f64>>,
    /// Lexical term vector, always present.
    sparse: BTreeMap<String, f64>,
    /// Insertion sequence for recency tie-breaks.
    seq: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexState {
    documents: Vec<StoredDocument>,
    next_seq: u64,
}

pub struct RetrievalIndex {
    model: Option<Arc<dyn EmbeddingModel>>,
    config: RetrievalConfig,
    state: RwLock<IndexState>,
}

impl RetrievalIndex {
    /// Open the index, loading persisted state when configured. Unreadable
    /// or corrupt state is logged and discarded; the caller can `rebuild`
    /// from source documents.
    pub fn open(config: RetrievalConfig, model: Option<Arc<dyn EmbeddingModel>>) -> Self {
        let state = match &config.store_path {
            Some(path) if path.exists() => match Self::load(path) {
                Ok(state) => state,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %AdvisorError::IndexCorruption(err.to_string()),
                        "discarding persisted index, starting empty"
                    );
                    IndexState::default()
                }
            },
            _ => IndexState::default(),
        };

        Self {
            model,
            config,
            state: RwLock::new(state),
        }
    }

    fn load(path: &std::path::Path) -> Result<IndexState, AdvisorError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.documents.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn embed_dense(&self, text: &str) -> Option<Vec<f64>> {
        let model = self.model.as_ref()?;
        match model.embed(text) {
            Ok(vector) => Some(vector),
            Err(err) => {
                tracing::warn!(
                    error = %AdvisorError::RetrievalUnavailable(err.to_string()),
                    "dense embedding failed, using lexical fallback"
                );
                None
            }
        }
    }

    /// Insert a document, replacing any existing document with the same id.
    pub fn upsert(&self, document: RetrievalDocument) -> Result<(), AdvisorError> {
        // Embed outside the lock; only the state swap needs the writer.
        let sparse = term_vector(&document.text);
        let dense = self.embed_dense(&document.text);

        {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let seq = state.next_seq;
            state.next_seq += 1;

            let stored = StoredDocument { document, dense, sparse, seq };
            match state
                .documents
                .iter_mut()
                .find(|d| d.document.id == stored.document.id)
            {
                Some(existing) => *existing = stored,
                None => state.documents.push(stored),
            }
        }

        self.persist()
    }

    /// Drop everything and re-index the given source documents.
    pub fn rebuild<I>(&self, documents: I) -> Result<(), AdvisorError>
    where
        I: IntoIterator<Item = RetrievalDocument>,
    {
        {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *state = IndexState::default();
        }
        for document in documents {
            self.upsert(document)?;
        }
        tracing::info!(documents = self.len(), "retrieval index rebuilt");
        Ok(())
    }

    /// Top-k documents by similarity, strictly non-increasing; equal
    /// similarities order most-recent-first. `top_k = 0` returns nothing.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        if top_k == 0 {
            return Vec::new();
        }

        let state = match self.state.read() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.documents.is_empty() {
            return Vec::new();
        }

        // Dense scoring only when the whole corpus lives in the dense
        // space; any gap drops the query onto the lexical path so scores
        // stay comparable.
        let query_dense = self
            .embed_dense(query)
            .filter(|_| state.documents.iter().all(|d| d.dense.is_some()));
        let query_sparse = term_vector(query);

        let mut scored: Vec<(f64, u64, &StoredDocument)> = state
            .documents
            .iter()
            .map(|doc| {
                let similarity = match (&query_dense, &doc.dense) {
                    (Some(query), Some(dense)) => dense_cosine(query, dense),
                    _ => sparse_cosine(&query_sparse, &doc.sparse),
                };
                (similarity, doc.seq, doc)
            })
            .filter(|(similarity, _, _)| *similarity >= self.config.min_similarity)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.1.cmp(&a.1))
        });
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(similarity, _, doc)| SearchHit {
                document: doc.document.clone(),
                similarity,
            })
            .collect()
    }

    /// Seed a small default corpus of strategy notes into an empty index.
    pub fn bootstrap(&self) -> Result<(), AdvisorError> {
        if !self.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let seeds = [
            (
                "seed-breakout",
                "Breakout entries want strong volume expansion above the prior range high; \
                 failed breakouts on thin volume tend to round-trip.",
                "strategies.md",
            ),
            (
                "seed-fundamentals",
                "Swing positions favor low leverage and return on equity above 18 percent; \
                 muted sales growth is a warning sign.",
                "fa_guidelines.md",
            ),
        ];
        for (id, text, source) in seeds {
            self.upsert(RetrievalDocument {
                id: id.to_string(),
                text: text.to_string(),
                source: source.to_string(),
                created_at: now,
            })?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), AdvisorError> {
        let Some(path) = &self.config.store_path else {
            return Ok(());
        };
        let payload = {
            let state = match self.state.read() {
                Ok(state) => state,
                Err(poisoned) => poisoned.into_inner(),
            };
            serde_json::to_string(&*state)?
        };
        fs::write(path, payload)?;
        Ok(())
    }
}
