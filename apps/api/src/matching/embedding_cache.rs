use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::llm_client::EmbeddingService;
use crate::matching::normalize_label;
use crate::store::{get_json, set_json, KvStore};

const STORE_PREFIX: &str = "embedding:";

/// Memoizes text → vector lookups against the embedding service.
///
/// Keys are normalized text. Lookups go memory → store → service; new vectors are
/// written back to the store best-effort. Entries are never evicted or invalidated.
/// A failed or timed-out service call yields a zero vector, which is not cached.
pub struct EmbeddingCache {
    service: Arc<dyn EmbeddingService>,
    store: Arc<dyn KvStore>,
    timeout: Duration,
    memory: RwLock<HashMap<String, Vec<f32>>>,
    /// One lock per in-flight miss so it is computed once; distinct keys never contend.
    /// An entry is dropped as soon as its lookup settles.
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EmbeddingCache {
    pub fn new(
        service: Arc<dyn EmbeddingService>,
        store: Arc<dyn KvStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            store,
            timeout,
            memory: RwLock::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.service.dimensions()
    }

    pub async fn vector_for(&self, text: &str) -> Vec<f32> {
        let key = normalize_label(text);
        if key.is_empty() {
            return self.zero_vector();
        }

        if let Some(vector) = self.memory.read().await.get(&key) {
            return vector.clone();
        }

        let key_lock = self.lock_for(&key).await;
        let vector = {
            let _guard = key_lock.lock().await;
            self.load_or_embed(&key).await
        };
        self.release_lock(&key, &key_lock).await;
        vector
    }

    /// Store, then service. Runs under the key's lock.
    async fn load_or_embed(&self, key: &str) -> Vec<f32> {
        // Another task may have filled the entry while we waited.
        if let Some(vector) = self.memory.read().await.get(key) {
            return vector.clone();
        }

        let store_key = format!("{STORE_PREFIX}{key}");
        match get_json::<Vec<f32>>(self.store.as_ref(), &store_key).await {
            Ok(Some(vector)) if vector.len() == self.dimensions() => {
                debug!("Embedding for '{key}' loaded from store");
                self.memory.write().await.insert(key.to_string(), vector.clone());
                return vector;
            }
            Ok(Some(vector)) => warn!(
                "Stored embedding for '{key}' has {} dimensions, expected {}; recomputing",
                vector.len(),
                self.dimensions()
            ),
            Ok(None) => {}
            Err(e) => warn!("Embedding store read failed for '{key}': {e}"),
        }

        let vector = match tokio::time::timeout(self.timeout, self.service.embed(key)).await {
            Ok(Ok(vector)) if vector.len() == self.dimensions() => vector,
            Ok(Ok(vector)) => {
                warn!(
                    "Embedding service returned {} dimensions for '{key}', expected {}",
                    vector.len(),
                    self.dimensions()
                );
                return self.zero_vector();
            }
            Ok(Err(e)) => {
                warn!("Embedding service failed for '{key}', using zero vector: {e}");
                return self.zero_vector();
            }
            Err(_) => {
                warn!(
                    "Embedding service timed out after {:?} for '{key}', using zero vector",
                    self.timeout
                );
                return self.zero_vector();
            }
        };

        if let Err(e) = set_json(self.store.as_ref(), &store_key, &vector, None).await {
            warn!("Failed to persist embedding for '{key}': {e}");
        }
        self.memory.write().await.insert(key.to_string(), vector.clone());
        vector
    }

    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.key_locks
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Drops the key's lock entry unless a later miss already replaced it.
    async fn release_lock(&self, key: &str, key_lock: &Arc<Mutex<()>>) {
        let mut locks = self.key_locks.lock().await;
        if locks.get(key).is_some_and(|current| Arc::ptr_eq(current, key_lock)) {
            locks.remove(key);
        }
    }

    fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.dimensions()]
    }
}
