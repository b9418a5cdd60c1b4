//! Redis-backed store for multi-instance deployments.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;

use super::{CacheError, CacheStore};
use crate::config::RedisConfig;

/// Store backed by a deadpool connection pool.
///
/// The pool connects lazily, so constructing a store never touches the
/// network. `timeout` bounds pool wait, connection setup and each command.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
    timeout: Duration,
}

impl RedisStore {
    /// Build the pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` if the URL cannot be parsed into a
    /// pool configuration.
    pub fn new(config: &RedisConfig) -> Result<Self, CacheError> {
        let timeout = Duration::from_millis(config.timeout_ms);

        let mut pool_config = PoolConfig::new(config.pool_size);
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);
        pool_config.timeouts.recycle = Some(timeout);

        let mut redis_config = Config::from_url(&config.url);
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Configuration(e.to_string()))?;

        Ok(Self { pool, timeout })
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                op,
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("status", &self.pool.status())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.bounded("get", async {
            let mut conn = self.pool.get().await?;
            let value: Option<Vec<u8>> = conn.get(key).await?;
            Ok::<_, CacheError>(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        // EX 0 is rejected by Redis.
        let ttl_secs = ttl.as_secs().max(1);
        self.bounded("set", async {
            let mut conn = self.pool.get().await?;
            let () = conn.set_ex(key, value, ttl_secs).await?;
            Ok::<_, CacheError>(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.bounded("delete", async {
            let mut conn = self.pool.get().await?;
            let () = conn.del(key).await?;
            Ok::<_, CacheError>(())
        })
        .await
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.bounded("flush", async {
            let mut conn = self.pool.get().await?;
            let () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
            Ok::<_, CacheError>(())
        })
        .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.bounded("ping", async {
            let mut conn = self.pool.get().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, CacheError>(())
        })
        .await
    }

    fn close(&self) {
        self.pool.close();
        tracing::info!("Redis pool closed");
    }
}
