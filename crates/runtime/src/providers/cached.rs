//! Response caching around any backend.

use crate::model::{Backend, ModelError, ModelRequest, ModelResponse};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use storage::{CacheKey, ResponseCache};
use tracing::debug;

/// Answers repeated requests from a [`ResponseCache`].
///
/// The key is the wrapped backend's display form (provider, model and
/// endpoint) plus the serialized request, so switching models never
/// returns a stale answer.
pub struct CachedBackend<B> {
    inner: B,
    identity: String,
    cache: Mutex<ResponseCache>,
}

impl<B: Backend + fmt::Display> CachedBackend<B> {
    pub fn new(inner: B, cache: ResponseCache) -> Self {
        Self {
            identity: inner.to_string(),
            inner,
            cache: Mutex::new(cache),
        }
    }
}

impl<B> CachedBackend<B> {
    // The connection holds no invariants a panicking writer could break.
    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: fmt::Display> fmt::Display for CachedBackend<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cached({})", self.inner)
    }
}

impl<B: Backend> Backend for CachedBackend<B> {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let key = CacheKey::new(self.identity.as_str(), &request)?;

        let hit = self.cache().get::<ModelResponse>(&key)?;
        if let Some(hit) = hit {
            debug!(backend = %self.identity, created_at = %hit.created_at, "cache hit");
            return Ok(hit.response);
        }

        let response = self.inner.call(request).await?;
        self.cache().put(&key, &response)?;
        debug!(backend = %self.identity, "cached response");
        Ok(response)
    }
}
