//! Quota-driven tier fallback.
//!
//! [`FallbackOrchestrator`] calls the primary tier and, only when that call
//! fails with `QuotaExceeded` and a fallback tier is configured, makes
//! exactly one more call against the fallback. There is no further
//! cascading and no retry on any other error.
//!
//! ```text
//! invoke(primary, fallback, prompt)
//!         │
//!         ▼
//!   ┌───────────────┐   Ok ──────────────► text
//!   │ primary tier  │   other error ─────► error
//!   └──────┬────────┘
//!          │ QuotaExceeded && fallback.is_some()
//!          ▼
//!   ┌───────────────┐   Ok ──────────────► text
//!   │ fallback tier │   any error ───────► error
//!   └───────────────┘
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{instrument, warn};

use super::traits::ModelClient;
use crate::Result;
use crate::telemetry;
use crate::types::{ModelTier, PromptSpec};

/// Calls a [`ModelClient`] with single-step quota fallback.
#[derive(Clone)]
pub struct FallbackOrchestrator {
    client: Arc<dyn ModelClient>,
}

impl FallbackOrchestrator {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    /// Call `primary`; on quota exhaustion retry once on `fallback`.
    #[instrument(skip_all, fields(client = self.client.name(), primary = %primary.identifier))]
    pub async fn invoke(
        &self,
        primary: &ModelTier,
        fallback: Option<&ModelTier>,
        prompt: &PromptSpec,
    ) -> Result<String> {
        match self.call(primary, prompt).await {
            Ok(text) => Ok(text),
            Err(e) if e.is_quota_exhausted() => {
                let Some(fallback) = fallback else {
                    return Err(e);
                };
                warn!(
                    from = %primary.identifier,
                    to = %fallback.identifier,
                    "primary tier quota exhausted, using fallback tier"
                );
                metrics::counter!(telemetry::FALLBACKS_TOTAL,
                    "from" => primary.identifier.clone(),
                    "to" => fallback.identifier.clone(),
                )
                .increment(1);
                self.call(fallback, prompt).await
            }
            Err(e) => Err(e),
        }
    }

    async fn call(&self, tier: &ModelTier, prompt: &PromptSpec) -> Result<String> {
        let start = Instant::now();
        let result = self.client.generate(tier, prompt).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::MODEL_CALLS_TOTAL,
            "model" => tier.identifier.clone(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::MODEL_CALL_DURATION_SECONDS,
            "model" => tier.identifier.clone(),
        )
        .record(start.elapsed().as_secs_f64());
        result
    }
}
