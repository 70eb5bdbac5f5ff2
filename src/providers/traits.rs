//! Model client trait.
//!
//! A [`ModelClient`] performs exactly one call against one tier and returns
//! the model's plain text. Implementations translate every upstream failure
//! into a closed set of [`GatewayError`](crate::GatewayError) kinds at the
//! boundary:
//!
//! - `QuotaExceeded`: the tier reported exhaustion; the orchestrator may
//!   try the fallback tier
//! - `Upstream`, `Http`, `EmptyResponse`: terminal for this request
//!
//! Nothing above this trait inspects upstream error text.

use async_trait::async_trait;

use crate::Result;
use crate::types::{ModelTier, PromptSpec};

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Client name for logging/debugging.
    fn name(&self) -> &str;

    /// Call `tier` once with `prompt` and return the extracted text.
    async fn generate(&self, tier: &ModelTier, prompt: &PromptSpec) -> Result<String>;
}
