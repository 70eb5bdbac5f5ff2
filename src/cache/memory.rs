//! In-process analysis cache.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;

use super::CacheStore;
use crate::Result;

/// Configuration for the in-memory store.
///
/// ```rust
/// # use nutrigate::cache::MemoryCacheConfig;
/// # use std::time::Duration;
/// let config = MemoryCacheConfig::new()
///     .max_entries(5_000)
///     .ttl(Duration::from_secs(24 * 3600));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// Maximum number of cached analyses. Default: 10,000.
    pub max_entries: u64,
    /// Time-to-live for each analysis. Default: 7 days.
    pub ttl: Duration,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(7 * 24 * 3600),
        }
    }
}

impl MemoryCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// moka-backed [`CacheStore`]. Never fails.
pub struct MemoryCacheStore {
    cache: Cache<String, Value>,
}

impl MemoryCacheStore {
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { cache }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(&MemoryCacheConfig::default())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, image_hash: &str) -> Result<Option<Value>> {
        Ok(self.cache.get(image_hash).await)
    }

    async fn insert(&self, image_hash: &str, analysis: &Value) -> Result<()> {
        // Append-only: the first analysis stored for a hash is kept.
        if !self.cache.contains_key(image_hash) {
            self.cache
                .insert(image_hash.to_string(), analysis.clone())
                .await;
        }
        Ok(())
    }
}
