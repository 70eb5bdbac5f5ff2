//! Cache-checked food photo analysis.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::Gateway;
use crate::cache::{image_hash, is_error_payload};
use crate::prompts::build_analyze_food;
use crate::types::{Action, AnalyzeFoodPayload, Route};
use crate::{GatewayError, Result, telemetry};

impl Gateway {
    /// Hash → lookup → (miss) model call → parse → store if error-free.
    ///
    /// Cache read failures count as misses and write failures are only
    /// logged; neither reaches the caller.
    #[instrument(skip_all)]
    pub(super) async fn analyze_cached(&self, payload: &AnalyzeFoodPayload) -> Result<Value> {
        let hash = image_hash(&payload.image.bytes, self.hash_prefix_bytes);

        match self.cache.get(&hash).await {
            Ok(Some(cached)) => {
                debug!(hash = %hash, store = self.cache.name(), "analysis cache hit");
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                return Ok(cached);
            }
            Ok(None) => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
            }
            Err(e) => {
                warn!(hash = %hash, store = self.cache.name(), error = %e, "cache lookup failed, treating as miss");
                metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "operation" => "get").increment(1);
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
            }
        }

        let prompt = build_analyze_food(payload);
        let route = Route::for_action(Action::AnalyzeFood);
        let text = self
            .orchestrator
            .invoke(
                self.tiers.get(route.primary),
                route.fallback.map(|r| self.tiers.get(r)),
                &prompt,
            )
            .await?;
        let analysis = parse_model_json(&text)?;

        if is_error_payload(&analysis) {
            debug!(hash = %hash, "analysis carries an error marker, not caching");
        } else if let Err(e) = self.cache.insert(&hash, &analysis).await {
            warn!(hash = %hash, store = self.cache.name(), error = %e, "cache write failed");
            metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "operation" => "insert")
                .increment(1);
        }

        Ok(analysis)
    }
}

/// Parse model output as JSON, tolerating a Markdown code fence around it.
pub(crate) fn parse_model_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(unfenced)
        .map_err(|e| GatewayError::MalformedResponse(format!("expected JSON output: {e}")))
}
