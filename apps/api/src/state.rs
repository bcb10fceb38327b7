use std::sync::Arc;

use crate::dialogue::DialogueEngine;
use crate::profile::ProfileExtractor;
use crate::scoring::RelevanceScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub dialogue: Arc<DialogueEngine>,
    /// Pluggable relevance scorer. Default: WeightedScorer over the semantic matcher.
    pub scorer: Arc<dyn RelevanceScorer>,
    pub extractor: ProfileExtractor,
}
