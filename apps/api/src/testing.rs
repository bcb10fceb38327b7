//! In-memory fakes for the external model services and the store.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::dialogue::{DialogueConfig, DialogueEngine};
use crate::llm_client::{ChatMessage, CompletionService, EmbeddingService, LlmError};
use crate::matching::semantic::DEFAULT_SIMILARITY_THRESHOLD;
use crate::matching::{EmbeddingCache, SemanticMatcher};
use crate::profile::ProfileExtractor;
use crate::scoring::{CriterionWeights, WeightedScorer};
use crate::state::AppState;
use crate::store::{InMemoryStore, KvStore, StoreError};

/// Replays canned replies in order and records every transcript it receives.
/// Runs dry with `LlmError::EmptyContent`.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<&str>) -> Self {
        Self::with_results(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(results: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _max_output_tokens: u32,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledCompletion;

#[async_trait]
impl CompletionService for StalledCompletion {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _max_output_tokens: u32,
    ) -> Result<String, LlmError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(LlmError::EmptyContent)
    }
}

/// Looks vectors up in a fixed table; unknown texts fail like an unavailable service.
pub struct StaticEmbedder {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl StaticEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingService for StaticEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors.get(text).cloned().ok_or(LlmError::Api {
            status: 503,
            message: format!("no vector for '{text}'"),
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Every operation fails, as a store whose backend is down would.
pub struct FailingStore;

fn store_down() -> StoreError {
    StoreError::Redis(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait]
impl KvStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(store_down())
    }

    async fn set(
        &self,
        _key: &str,
        _value: String,
        _ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        Err(store_down())
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Err(store_down())
    }

    async fn keys(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Err(store_down())
    }
}

pub fn cache_with(embedder: Arc<StaticEmbedder>) -> Arc<EmbeddingCache> {
    Arc::new(EmbeddingCache::new(
        embedder,
        Arc::new(InMemoryStore::new()),
        Duration::from_secs(5),
    ))
}

pub fn matcher_with(embedder: Arc<StaticEmbedder>) -> SemanticMatcher {
    SemanticMatcher::new(cache_with(embedder), DEFAULT_SIMILARITY_THRESHOLD)
}

/// Matcher whose embedding service knows no texts: only exact matches are similar.
pub fn exact_only_matcher() -> SemanticMatcher {
    matcher_with(Arc::new(StaticEmbedder::new(4)))
}

/// Full application state over in-memory fakes; scoring matches labels exactly.
pub fn app_state_with(llm: Arc<dyn CompletionService>) -> AppState {
    AppState {
        dialogue: Arc::new(DialogueEngine::new(
            llm.clone(),
            Arc::new(InMemoryStore::new()),
            DialogueConfig::default(),
        )),
        scorer: Arc::new(WeightedScorer::new(
            exact_only_matcher(),
            CriterionWeights::default(),
        )),
        extractor: ProfileExtractor::new(llm),
    }
}
