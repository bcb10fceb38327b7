//! Semantic matching over text embeddings.
//!
//! `EmbeddingCache` memoizes vectors from the external embedding service;
//! `SemanticMatcher` turns cosine similarity into label equivalence.

pub mod embedding_cache;
pub mod semantic;
pub mod similarity;

pub use embedding_cache::EmbeddingCache;
pub use semantic::SemanticMatcher;

/// Canonical form of a label: trimmed and case-folded.
pub fn normalize_label(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::normalize_label;

    #[test]
    fn test_normalize_label_trims_and_folds_case() {
        assert_eq!(normalize_label("  Backend "), "backend");
        assert_eq!(normalize_label("ПОЛНАЯ занятость"), "полная занятость");
    }
}
