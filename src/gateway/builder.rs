//! Builder for configuring gateway instances

use std::sync::Arc;

use super::Gateway;
use crate::cache::{CacheStore, DEFAULT_HASH_PREFIX_BYTES, MemoryCacheStore};
use crate::limiter::{FixedWindowLimiter, RateLimitConfig, RateLimiter};
use crate::providers::gemini::DEFAULT_BASE_URL;
use crate::providers::{FallbackOrchestrator, GeminiClient, ModelClient};
use crate::types::ModelTiers;
use crate::{GatewayError, Result};

/// Builder for configuring gateway instances.
///
/// ```rust,no_run
/// # use nutrigate::Gateway;
/// # fn main() -> nutrigate::Result<()> {
/// let gateway = Gateway::builder()
///     .gemini("your-api-key")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct GatewayBuilder {
    gemini_key: Option<String>,
    client: Option<Arc<dyn ModelClient>>,
    tiers: Option<ModelTiers>,
    limits: RateLimitConfig,
    limiter: Option<Arc<dyn RateLimiter>>,
    cache: Option<Arc<dyn CacheStore>>,
    hash_prefix_bytes: usize,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self {
            gemini_key: None,
            client: None,
            tiers: None,
            limits: RateLimitConfig::default(),
            limiter: None,
            cache: None,
            hash_prefix_bytes: DEFAULT_HASH_PREFIX_BYTES,
        }
    }

    /// Use the Gemini API with this key.
    pub fn gemini(mut self, api_key: impl Into<String>) -> Self {
        self.gemini_key = Some(api_key.into());
        self
    }

    /// Use a custom model client. Takes precedence over [`gemini`](Self::gemini).
    pub fn model_client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the four model tiers (default: Gemini models on the public API).
    pub fn tiers(mut self, tiers: ModelTiers) -> Self {
        self.tiers = Some(tiers);
        self
    }

    /// Set per-action request ceilings.
    pub fn rate_limits(mut self, limits: RateLimitConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the in-process [`FixedWindowLimiter`], e.g. with a shared store.
    pub fn rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Set the analysis cache store (default: in-memory [`MemoryCacheStore`]).
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(store);
        self
    }

    /// Number of leading image bytes hashed for the cache key.
    pub fn hash_prefix_bytes(mut self, n: usize) -> Self {
        self.hash_prefix_bytes = n;
        self
    }

    /// Build the gateway.
    ///
    /// Fails with `Configuration` when no model client or API key is set.
    pub fn build(self) -> Result<Gateway> {
        let client: Arc<dyn ModelClient> = match (self.client, self.gemini_key) {
            (Some(client), _) => client,
            (None, Some(key)) => Arc::new(GeminiClient::new(key)?),
            (None, None) => {
                return Err(GatewayError::Configuration(
                    "no model API key configured".to_string(),
                ));
            }
        };
        if self.hash_prefix_bytes == 0 {
            return Err(GatewayError::Configuration(
                "hash prefix length must be greater than zero".to_string(),
            ));
        }

        Ok(Gateway {
            orchestrator: FallbackOrchestrator::new(client),
            tiers: self
                .tiers
                .unwrap_or_else(|| ModelTiers::gemini_defaults(DEFAULT_BASE_URL)),
            limits: self.limits,
            limiter: self
                .limiter
                .unwrap_or_else(|| Arc::new(FixedWindowLimiter::new())),
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(MemoryCacheStore::default())),
            hash_prefix_bytes: self.hash_prefix_bytes,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
