//! nutrigate - AI request gateway for a nutrition app
//!
//! This crate sits between app clients and a family of Gemini models. It
//! validates `{action, payload}` requests, enforces per-client per-action
//! quotas, builds prompts, routes each action to a model tier with a
//! one-step fallback on quota exhaustion, and caches food-photo analyses
//! by image content.
//!
//! # Example
//!
//! ```rust,no_run
//! use nutrigate::{ClientIdentity, Gateway, RawActionRequest};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> nutrigate::Result<()> {
//!     let gateway = Gateway::builder()
//!         .gemini("your-api-key")
//!         .build()?;
//!
//!     let raw: RawActionRequest = serde_json::from_value(json!({
//!         "action": "calculate-nutrition",
//!         "payload": { "description": "two eggs and a slice of toast" }
//!     }))?;
//!
//!     let reply = gateway.dispatch(raw, ClientIdentity::user("u-1")).await;
//!     println!("{}", reply.outcome?);
//!     Ok(())
//! }
//! ```
//!
//! With the `server` feature (default) the [`server`] module exposes the
//! gateway over HTTP, and the `nutrigated` binary runs it.

pub mod cache;
pub mod error;
pub mod gateway;
pub mod limiter;
pub mod prompts;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types at crate root
pub use cache::{CacheStore, MemoryCacheStore, PostgrestCacheStore};
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, GatewayBuilder, GatewayReply};
pub use limiter::{FixedWindowLimiter, RateDecision, RateLimitConfig, RateLimiter};
pub use providers::{FallbackOrchestrator, GeminiClient, ModelClient};
pub use types::{
    Action, ActionPayload, ActionRequest, ClientIdentity, ModelTier, ModelTiers, PromptSpec,
    RawActionRequest, Route, TierRole,
};
