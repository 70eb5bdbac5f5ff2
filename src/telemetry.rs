//! Telemetry metric name constants.
//!
//! Centralised metric names for gateway operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `nutrigate_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `action`: wire name of the action (e.g. "chat", "analyze-food")
//! - `model`: model identifier of the tier that was called
//! - `status`: outcome, "ok" or "error"

/// Total upstream model calls.
///
/// Labels: `model`, `status` ("ok" | "error").
pub const MODEL_CALLS_TOTAL: &str = "nutrigate_model_calls_total";

/// Upstream model call duration in seconds.
///
/// Labels: `model`.
pub const MODEL_CALL_DURATION_SECONDS: &str = "nutrigate_model_call_duration_seconds";

/// Fallback attempts triggered by primary-tier quota exhaustion.
///
/// Labels: `from`, `to` (model identifiers).
pub const FALLBACKS_TOTAL: &str = "nutrigate_fallbacks_total";

/// Total dispatched requests by outcome.
///
/// Labels: `action`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "nutrigate_requests_total";

/// End-to-end duration of requests that passed the rate limiter.
///
/// Labels: `action`.
pub const REQUEST_DURATION_SECONDS: &str = "nutrigate_request_duration_seconds";

/// Requests rejected by the per-client rate limiter.
///
/// Labels: `action`.
pub const RATE_LIMITED_TOTAL: &str = "nutrigate_rate_limited_total";

/// Photo analysis cache hits.
pub const CACHE_HITS_TOTAL: &str = "nutrigate_cache_hits_total";

/// Photo analysis cache misses (including read failures).
pub const CACHE_MISSES_TOTAL: &str = "nutrigate_cache_misses_total";

/// Cache store read or write failures.
///
/// Labels: `operation` ("get" | "insert").
pub const CACHE_ERRORS_TOTAL: &str = "nutrigate_cache_errors_total";
