//! Raw key-value store behind the cache facade.

use std::time::Duration;

use async_trait::async_trait;

use super::CacheError;

/// A byte-oriented key-value store with per-entry expiry.
///
/// Implementations report every failure as a [`CacheError`]; deciding that a
/// failure is harmless is the job of [`Cache`](super::Cache).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short name for logs and readiness output ("redis", "memory").
    fn name(&self) -> &'static str;

    /// Fetch a value. `Ok(None)` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Remove a value. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every value.
    async fn flush(&self) -> Result<(), CacheError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), CacheError>;

    /// Release connections. Called once on shutdown.
    fn close(&self) {}
}
