pub mod api;
pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod storage;

use std::sync::Arc;

pub use cache::{Cache, CacheError, CacheStore, MemoryStore, RedisStore};
pub use config::{AppConfig, CacheConfig, RedisConfig, ServerConfig};
pub use observability::init_tracing;
pub use server::{AppState, BackofficeServer, ServerBuilder, build_app};
pub use storage::InMemoryUserStorage;

/// Create the cache based on configuration.
///
/// ## Cache Modes
///
/// - **Redis disabled**: in-process [`MemoryStore`]
/// - **Redis enabled**: [`RedisStore`]; falls back to memory only if the pool
///   cannot be configured
///
/// An unreachable Redis server is not fatal: the pool keeps retrying lazily
/// and every cache call degrades to a miss in the meantime.
pub async fn create_cache(config: &RedisConfig) -> Cache {
    if !config.enabled {
        tracing::info!("Redis disabled, using in-memory cache");
        return Cache::memory();
    }

    let store = match RedisStore::new(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to create Redis pool. Falling back to in-memory cache."
            );
            return Cache::memory();
        }
    };

    let cache = Cache::new(Arc::new(store));
    if cache.is_available().await {
        tracing::info!(pool_size = config.pool_size, "Connected to Redis");
    } else {
        tracing::warn!("Redis unreachable at startup; requests will bypass the cache until it recovers");
    }
    cache
}
