// Relevance scoring: candidate profile vs vacancy profile.
// Deterministic apart from label similarity, which goes through the SemanticMatcher.

pub mod criteria;
pub mod engine;
pub mod handlers;

pub use criteria::CriterionWeights;
pub use engine::{RelevanceScorer, ScoringResult, WeightedScorer};
