//! Process-wide cache for loaded classifiers.
//!
//! Loading weights is the only expensive step of an analysis session, so the
//! pipeline builder goes through this cache: the first build for a given
//! model source and device loads the model, later builds get a clone that
//! shares the same tensors.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Implemented by model option types to produce a stable cache key.
pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

type CacheStorage = HashMap<(TypeId, String), Arc<dyn Any + Send + Sync>>;

/// A thread-safe map from `(model type, key)` to a loaded model.
pub struct ModelCache {
    cache: Arc<Mutex<CacheStorage>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the cached model for `key`, running `loader` only on a miss.
    ///
    /// A failed load leaves the cache untouched, so a later call retries.
    pub async fn get_or_load<M, Fut, F>(&self, key: &str, loader: F) -> anyhow::Result<M>
    where
        M: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<M>>,
    {
        let cache_key = (TypeId::of::<M>(), key.to_string());

        {
            let cache = self.cache.lock().await;
            if let Some(model) = cache.get(&cache_key).and_then(|m| m.downcast_ref::<M>()) {
                tracing::debug!(key, "model cache hit");
                return Ok(model.clone());
            }
        }

        tracing::debug!(key, "model cache miss, loading");
        let model = loader().await?;

        let mut cache = self.cache.lock().await;
        cache.insert(cache_key, Arc::new(model.clone()) as Arc<dyn Any + Send + Sync>);

        Ok(model)
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MODEL_CACHE: once_cell::sync::Lazy<ModelCache> =
    once_cell::sync::Lazy::new(ModelCache::new);

/// The cache shared by every pipeline built in this process.
pub fn global_cache() -> &'static ModelCache {
    &GLOBAL_MODEL_CACHE
}
