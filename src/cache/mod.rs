//! Content-addressed cache for food photo analyses.
//!
//! Records are keyed by the SHA-256 hex digest of a bounded prefix of the
//! decoded image bytes and hold the parsed JSON analysis. Two backends
//! implement [`CacheStore`]:
//!
//! - [`PostgrestCacheStore`]: the persistent table shared by every gateway
//!   instance, reached over PostgREST.
//! - [`MemoryCacheStore`]: moka LRU + TTL, per process. Used when no
//!   persistent store is configured, and in tests.
//!
//! Both are best-effort: the dispatcher treats read failures as misses and
//! logs write failures. Record retention belongs to the store.
//!
//! # Concurrent identical submissions
//!
//! There is no in-flight coalescing: two concurrent uploads of the same
//! photo can both miss and both reach the model. If that becomes costly,
//! the usual remedy is a single-flight map (hash → shared in-progress
//! future) in front of the store, e.g. moka's `Cache::try_get_with`, which
//! collapses concurrent initialisations of one key.

mod memory;
mod postgrest;

pub use memory::{MemoryCacheConfig, MemoryCacheStore};
pub use postgrest::{DEFAULT_TABLE, PostgrestCacheStore};

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::Result;

/// Default number of leading image bytes fed to the hash.
pub const DEFAULT_HASH_PREFIX_BYTES: usize = 64 * 1024;

/// Persistent lookup of analysis results by image hash.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name for logging/debugging.
    fn name(&self) -> &str;

    /// Exact-match lookup. `Ok(None)` on a miss.
    async fn get(&self, image_hash: &str) -> Result<Option<Value>>;

    /// Store a new record for `image_hash`.
    async fn insert(&self, image_hash: &str, analysis: &Value) -> Result<()>;
}

/// Hex SHA-256 of the first `prefix_len` bytes of `bytes`.
///
/// Truncation bounds hashing cost on large photos; two images sharing the
/// same prefix would collide, which is an accepted risk.
pub fn image_hash(bytes: &[u8], prefix_len: usize) -> String {
    let end = bytes.len().min(prefix_len);
    hex::encode(Sha256::digest(&bytes[..end]))
}

/// Whether a parsed analysis carries an error marker and must not be cached.
///
/// Markers: a non-null `error` field, or `isFood: false`.
pub fn is_error_payload(analysis: &Value) -> bool {
    let Some(obj) = analysis.as_object() else {
        return true;
    };
    let has_error = obj
        .get("error")
        .is_some_and(|e| !(e.is_null() || e == &Value::Bool(false) || e == ""));
    let not_food = obj.get("isFood") == Some(&Value::Bool(false));
    has_error || not_food
}
