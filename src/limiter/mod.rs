//! Per-client, per-action request quotas.
//!
//! The dispatcher only talks to the [`RateLimiter`] trait. The default
//! store, [`FixedWindowLimiter`], keeps counters in process memory.
//!
//! # Multi-instance caveat
//!
//! Counters are not shared between gateway instances. Behind a load
//! balancer each warm instance enforces its own budget, so the limit a
//! client effectively sees is `limit × instances`. This is accepted as
//! abuse dampening, not a hard quota. A shared counter store (e.g. redis
//! `INCR` + `EXPIRE`) can replace the in-process map by implementing
//! [`RateLimiter`] and passing it to
//! [`GatewayBuilder::rate_limiter()`](crate::GatewayBuilder::rate_limiter);
//! no call sites change.

mod fixed_window;

pub use fixed_window::FixedWindowLimiter;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::types::Action;

/// Outcome of a limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Configured ceiling for this key.
    pub limit: u32,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Time until the current window ends.
    pub reset_after: Duration,
}

/// Counter store behind the dispatcher's quota check.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request for `key` and decide whether it may proceed.
    async fn allow(&self, key: &str, limit: u32, window: Duration) -> RateDecision;
}

/// Per-action request ceilings over a shared window length.
///
/// ```rust
/// # use nutrigate::limiter::RateLimitConfig;
/// # use nutrigate::types::Action;
/// # use std::time::Duration;
/// let config = RateLimitConfig::new()
///     .window(Duration::from_secs(3600))
///     .limit(Action::AnalyzeFood, 20);
/// assert_eq!(config.limit_for(Action::AnalyzeFood), 20);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Window length. Default: 1 hour.
    pub window: Duration,
    /// Ceiling for actions without an explicit entry. Default: 30.
    pub default_limit: u32,
    /// Explicit per-action ceilings.
    pub per_action: HashMap<Action, u32>,
}

/// Longest supported window. Longer windows are clamped by the limiter and
/// rejected by config loading.
pub const MAX_WINDOW: Duration = Duration::from_secs(366 * 24 * 3600);

/// Built-in per-action ceilings.
pub fn default_action_limits() -> HashMap<Action, u32> {
    HashMap::from([
        (Action::Chat, 60),
        (Action::AnalyzeFood, 20),
        (Action::CalculateNutrition, 30),
        (Action::GenerateMealPlan, 10),
        (Action::GenerateRecipes, 15),
        (Action::GenerateShoppingList, 15),
        (Action::GenerateClinicalSummary, 10),
    ])
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(3600),
            default_limit: 30,
            per_action: default_action_limits(),
        }
    }
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window length.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the ceiling used when an action has no explicit entry.
    pub fn default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the ceiling for one action.
    pub fn limit(mut self, action: Action, limit: u32) -> Self {
        self.per_action.insert(action, limit);
        self
    }

    /// Replace the whole per-action table. Actions missing from `per_action`
    /// fall back to the default ceiling.
    pub fn action_limits(mut self, per_action: HashMap<Action, u32>) -> Self {
        self.per_action = per_action;
        self
    }

    /// Remove an action's explicit ceiling so the default applies.
    pub fn clear_limit(mut self, action: Action) -> Self {
        self.per_action.remove(&action);
        self
    }

    pub fn limit_for(&self, action: Action) -> u32 {
        self.per_action
            .get(&action)
            .copied()
            .unwrap_or(self.default_limit)
    }
}
