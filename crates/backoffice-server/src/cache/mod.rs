//! Cache-aside store.
//!
//! [`Cache`] is the only type handlers touch. It serializes values as JSON,
//! delegates to a [`CacheStore`] and turns every store failure into a miss
//! (`None`) or a `false` return, so a broken cache slows requests down but
//! never fails them.
//!
//! ## Backends
//!
//! | Store | Use |
//! |-------|-----|
//! | [`RedisStore`] | shared across instances |
//! | [`MemoryStore`] | single instance, tests |

mod memory;
mod redis;
mod store;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use store::CacheStore;

/// Errors reported by a [`CacheStore`].
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Cache operation '{op}' timed out after {timeout_ms}ms")]
    Timeout { op: &'static str, timeout_ms: u64 },

    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache configuration error: {0}")]
    Configuration(String),

    #[error("TTL of {ttl_secs}s is out of range for the '{store}' store")]
    TtlOutOfRange { store: &'static str, ttl_secs: u64 },
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Failure-tolerant cache facade. Cheap to clone.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Cache over a fresh [`MemoryStore`].
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Name of the underlying store.
    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    /// Read and deserialize a value.
    ///
    /// Returns `None` on a miss, when the stored bytes don't deserialize as
    /// `T`, or when the store fails.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %key, "cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, backend = self.backend(), error = %e, "Cache GET failed");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Serialize and store a value for `ttl_secs` seconds.
    ///
    /// Returns `false` if the value can't be serialized, the TTL is zero or
    /// the store fails.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_secs: u64) -> bool {
        if ttl_secs == 0 {
            warn!(key = %key, "Refusing to cache with zero TTL");
            return false;
        }

        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize value for cache");
                return false;
            }
        };

        match self
            .store
            .set(key, &bytes, Duration::from_secs(ttl_secs))
            .await
        {
            Ok(()) => {
                debug!(key = %key, ttl_secs, "cache set");
                true
            }
            Err(e) => {
                warn!(key = %key, backend = self.backend(), error = %e, "Cache SET failed");
                false
            }
        }
    }

    /// Remove a value. `false` only when the store fails.
    pub async fn delete(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, backend = self.backend(), error = %e, "Cache DELETE failed");
                false
            }
        }
    }

    /// Remove every value. `false` only when the store fails.
    pub async fn clear_all(&self) -> bool {
        match self.store.flush().await {
            Ok(()) => true,
            Err(e) => {
                warn!(backend = self.backend(), error = %e, "Cache FLUSH failed");
                false
            }
        }
    }

    /// Cache-aside read.
    ///
    /// Returns the cached value if present, otherwise calls `loader`, stores
    /// its result best-effort and returns it. Errors from `loader` propagate;
    /// cache errors never do.
    pub async fn get_or_load<T, E, F, Fut>(&self, key: &str, ttl_secs: u64, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get(key).await {
            return Ok(cached);
        }

        let value = loader().await?;
        self.set(key, &value, ttl_secs).await;
        Ok(value)
    }

    /// Whether the store currently answers a ping.
    pub async fn is_available(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                debug!(backend = self.backend(), error = %e, "Cache ping failed");
                false
            }
        }
    }

    /// Release the store's connections.
    pub fn close(&self) {
        self.store.close();
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.backend())
            .finish()
    }
}
