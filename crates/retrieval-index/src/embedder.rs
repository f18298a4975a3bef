//! Embedding backends. A dense model is an external collaborator behind
//! [`EmbeddingModel`]; the lexical term-frequency path is always available
//! and needs no model at all. Both live in vector spaces scored with cosine
//! similarity, so callers never care which one is active.

use std::collections::BTreeMap;

use advisor_core::AdvisorError;

/// Dense embedding collaborator (e.g. a sentence-transformer service).
/// Failures map to `RetrievalUnavailable` and route callers onto the
/// lexical path.
pub trait EmbeddingModel: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f64>, AdvisorError>;
}

/// L2-normalized term-frequency vector over the document's own tokens.
pub fn term_vector(text: &str) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        *counts.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
    }

    let norm = counts.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in counts.values_mut() {
            *value /= norm;
        }
    }
    counts
}

/// Cosine similarity of two sparse term vectors.
pub fn sparse_cosine(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> f64 {
    // Vectors are already L2-normalized, so the dot product is the cosine.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(token, weight)| large.get(token).map(|other| weight * other))
        .sum()
}

/// Cosine similarity of two dense vectors.
pub fn dense_cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
