//! Gateway error types

use std::time::Duration;

/// Gateway error types
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    // Caller-facing errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    // Upstream model errors
    /// The tier reported quota exhaustion. Triggers at most one fallback.
    #[error("model quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("upstream error ({status:?}): {message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("model returned malformed output: {0}")]
    MalformedResponse(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Absorbed internally on the analysis path, never surfaced
    #[error("cache store error: {0}")]
    Cache(String),
}

impl GatewayError {
    /// Whether a fallback tier should be attempted for this error.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, GatewayError::QuotaExceeded(_))
    }

    /// Retry hint for rate-limited callers.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GatewayError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status code the error maps to at the inbound boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Validation(_) | GatewayError::Json(_) => 400,
            GatewayError::PayloadTooLarge { .. } => 413,
            GatewayError::RateLimited { .. } => 429,
            GatewayError::Configuration(_) | GatewayError::Cache(_) => 500,
            GatewayError::QuotaExceeded(_)
            | GatewayError::Upstream { .. }
            | GatewayError::Http(_)
            | GatewayError::EmptyResponse
            | GatewayError::MalformedResponse(_) => 502,
        }
    }

    /// Human-readable message shown to end users.
    ///
    /// Never includes upstream error text. Validation messages are produced
    /// by the gateway itself and are passed through.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Configuration(_) => {
                "The AI assistant is not configured on the server. Please contact support."
                    .to_string()
            }
            GatewayError::Validation(reason) => format!("Invalid request: {reason}"),
            GatewayError::Json(_) => "Invalid request: the body is not valid JSON.".to_string(),
            GatewayError::PayloadTooLarge { .. } => {
                "The request is too large. Please send a smaller photo.".to_string()
            }
            GatewayError::RateLimited { retry_after } => match retry_after {
                Some(wait) if wait.as_secs() >= 60 => format!(
                    "You have reached the request limit for this feature. Please try again in {} minutes.",
                    wait.as_secs().div_ceil(60)
                ),
                Some(wait) => format!(
                    "You have reached the request limit for this feature. Please try again in {} seconds.",
                    wait.as_secs().max(1)
                ),
                None => "You have reached the request limit for this feature. Please try again later."
                    .to_string(),
            },
            GatewayError::QuotaExceeded(_) => {
                "The AI service is busy right now. Please wait a moment and try again.".to_string()
            }
            GatewayError::Upstream { .. }
            | GatewayError::Http(_)
            | GatewayError::EmptyResponse
            | GatewayError::MalformedResponse(_)
            | GatewayError::Cache(_) => {
                "The AI service could not process your request. Please try again.".to_string()
            }
        }
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
