//! Action dispatcher: the gateway's entry point.
//!
//! ```text
//! dispatch(raw, client)
//!     │ parse action + payload ──────► Validation error (no calls made)
//!     ▼
//! rate limiter (client|action) ─────► RateLimited (no model call)
//!     │ allowed
//!     ▼
//! prompt builder
//!     │
//!     ├── analyze-food ──► cache-checked flow ──► orchestrator (vision tiers)
//!     └── other actions ─────────────────────────► orchestrator (routed tiers)
//! ```

mod analysis;
mod builder;

pub use builder::GatewayBuilder;

use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, info_span, warn};

use crate::cache::CacheStore;
use crate::limiter::{RateDecision, RateLimitConfig, RateLimiter};
use crate::providers::FallbackOrchestrator;
use crate::types::{ActionPayload, ActionRequest, ClientIdentity, ModelTiers, RawActionRequest, Route};
use crate::{GatewayError, Result, prompts, telemetry};

/// Result of one dispatched request plus the caller's quota state.
#[derive(Debug)]
pub struct GatewayReply {
    /// Quota after this request; `None` when the request was rejected
    /// before reaching the limiter.
    pub quota: Option<RateDecision>,
    /// Response text (JSON text for structured actions).
    pub outcome: Result<String>,
}

impl GatewayReply {
    fn rejected(err: GatewayError) -> Self {
        Self {
            quota: None,
            outcome: Err(err),
        }
    }
}

/// The AI-request gateway.
pub struct Gateway {
    orchestrator: FallbackOrchestrator,
    tiers: ModelTiers,
    limits: RateLimitConfig,
    limiter: Arc<dyn RateLimiter>,
    cache: Arc<dyn CacheStore>,
    hash_prefix_bytes: usize,
}

impl Gateway {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Validate and run a raw inbound request.
    pub async fn dispatch(&self, raw: RawActionRequest, client: ClientIdentity) -> GatewayReply {
        match ActionRequest::parse(raw, client) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "rejected invalid request");
                GatewayReply::rejected(e)
            }
        }
    }

    /// Run an already validated request.
    pub async fn handle(&self, request: ActionRequest) -> GatewayReply {
        let span = info_span!("dispatch", action = %request.action, client = %request.client);
        async move {
            let action = request.action;
            let decision = self
                .limiter
                .allow(
                    &request.client.rate_key(action),
                    self.limits.limit_for(action),
                    self.limits.window,
                )
                .await;

            if !decision.allowed {
                warn!(limit = decision.limit, "client rate limited");
                metrics::counter!(telemetry::RATE_LIMITED_TOTAL, "action" => action.as_str())
                    .increment(1);
                return GatewayReply {
                    quota: Some(decision),
                    outcome: Err(GatewayError::RateLimited {
                        retry_after: Some(decision.reset_after),
                    }),
                };
            }

            let start = Instant::now();
            let outcome = self.execute(&request.payload).await;
            metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "action" => action.as_str())
                .record(start.elapsed().as_secs_f64());
            let status = if outcome.is_ok() { "ok" } else { "error" };
            metrics::counter!(telemetry::REQUESTS_TOTAL,
                "action" => action.as_str(),
                "status" => status,
            )
            .increment(1);
            if let Err(e) = &outcome {
                warn!(error = %e, "request failed");
            }

            GatewayReply {
                quota: Some(decision),
                outcome,
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, payload: &ActionPayload) -> Result<String> {
        if let ActionPayload::AnalyzeFood(p) = payload {
            let analysis = self.analyze_cached(p).await?;
            return Ok(analysis.to_string());
        }

        let action = payload.action();
        let prompt = prompts::build(payload);
        let route = Route::for_action(action);
        let text = self
            .orchestrator
            .invoke(
                self.tiers.get(route.primary),
                route.fallback.map(|r| self.tiers.get(r)),
                &prompt,
            )
            .await?;

        if action.is_structured() {
            let value = analysis::parse_model_json(&text)?;
            Ok(value.to_string())
        } else {
            Ok(text.trim().to_string())
        }
    }
}
