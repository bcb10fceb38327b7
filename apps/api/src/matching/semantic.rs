use std::sync::Arc;

use crate::matching::similarity::cosine_similarity;
use crate::matching::{normalize_label, EmbeddingCache};

/// Default similarity at or above which two labels are treated as equivalent.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;

/// Decides label equivalence ("full-time" / "fulltime" / "полная занятость")
/// from embedding similarity, without per-locale synonym tables.
#[derive(Clone)]
pub struct SemanticMatcher {
    cache: Arc<EmbeddingCache>,
    threshold: f32,
}

impl SemanticMatcher {
    pub fn new(cache: Arc<EmbeddingCache>, threshold: f32) -> Self {
        Self { cache, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Similarity of two labels. Identical normalized labels score 1.0 without
    /// an embedding lookup; blank labels score 0.0.
    pub async fn similarity(&self, a: &str, b: &str) -> f32 {
        let (a, b) = (normalize_label(a), normalize_label(b));
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }
        let left = self.cache.vector_for(&a).await;
        let right = self.cache.vector_for(&b).await;
        cosine_similarity(&left, &right)
    }

    pub async fn are_similar(&self, a: &str, b: &str) -> bool {
        self.similarity(a, b).await >= self.threshold
    }

    /// The candidate most similar to `target` among those clearing the threshold.
    /// Ties go to the earliest candidate.
    pub async fn best_match<'a>(&self, target: &str, candidates: &'a [String]) -> Option<&'a str> {
        let mut best: Option<(&'a str, f32)> = None;

        for candidate in candidates {
            let score = self.similarity(target, candidate).await;
            if score < self.threshold {
                continue;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((candidate.as_str(), score));
            }
            if score >= 1.0 {
                break;
            }
        }

        best.map(|(candidate, _)| candidate)
    }
}
