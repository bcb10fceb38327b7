//! Key-value store behind sessions and the embedding cache.
//!
//! The core depends only on `KvStore`; the backing technology is picked at
//! startup (`RedisStore` when `REDIS_URL` is set, `InMemoryStore` otherwise).

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Narrow keyed storage: get / set with optional expiry / delete / prefix listing.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>)
        -> Result<(), StoreError>;

    /// Returns `true` when a value was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// All live keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Reads and deserializes a JSON value.
pub async fn get_json<T: serde::de::DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serializes and writes a JSON value.
pub async fn set_json<T: serde::Serialize + Sync>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, raw, ttl).await
}
