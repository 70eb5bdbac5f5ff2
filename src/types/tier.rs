//! Model tiers and per-action routing.

use serde::{Deserialize, Serialize};

use super::Action;

/// Role a configured model plays, chosen per action by cost/accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierRole {
    VisionPrimary,
    VisionFallback,
    Logic,
    Lite,
}

/// A single configured model endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTier {
    /// Model identifier (e.g. `gemini-2.5-flash`).
    pub identifier: String,
    /// Full `generateContent` URL, without the API key.
    pub endpoint: String,
}

impl ModelTier {
    pub fn new(identifier: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Build a tier whose endpoint follows the Gemini REST layout
    /// `{base_url}/models/{model}:generateContent`.
    pub fn gemini(base_url: &str, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let endpoint = format!(
            "{}/models/{identifier}:generateContent",
            base_url.trim_end_matches('/')
        );
        Self {
            identifier,
            endpoint,
        }
    }
}

/// The four statically configured tiers. Immutable after startup.
#[derive(Debug, Clone)]
pub struct ModelTiers {
    pub vision_primary: ModelTier,
    pub vision_fallback: ModelTier,
    pub logic: ModelTier,
    pub lite: ModelTier,
}

/// Default model per role.
pub const DEFAULT_VISION_PRIMARY_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VISION_FALLBACK_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_LOGIC_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_LITE_MODEL: &str = "gemini-2.5-flash-lite";

impl ModelTiers {
    /// Default models, all served from the Gemini REST `base_url`.
    pub fn gemini_defaults(base_url: &str) -> Self {
        Self {
            vision_primary: ModelTier::gemini(base_url, DEFAULT_VISION_PRIMARY_MODEL),
            vision_fallback: ModelTier::gemini(base_url, DEFAULT_VISION_FALLBACK_MODEL),
            logic: ModelTier::gemini(base_url, DEFAULT_LOGIC_MODEL),
            lite: ModelTier::gemini(base_url, DEFAULT_LITE_MODEL),
        }
    }

    pub fn get(&self, role: TierRole) -> &ModelTier {
        match role {
            TierRole::VisionPrimary => &self.vision_primary,
            TierRole::VisionFallback => &self.vision_fallback,
            TierRole::Logic => &self.logic,
            TierRole::Lite => &self.lite,
        }
    }
}

/// Primary and optional fallback tier for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub primary: TierRole,
    pub fallback: Option<TierRole>,
}

impl Route {
    /// Routing table: vision actions use the vision pair, structured text
    /// work runs on the logic tier with lite as the cheap fallback, and
    /// conversational chat stays on lite only.
    pub fn for_action(action: Action) -> Self {
        match action {
            Action::AnalyzeFood => Route {
                primary: TierRole::VisionPrimary,
                fallback: Some(TierRole::VisionFallback),
            },
            Action::CalculateNutrition
            | Action::GenerateMealPlan
            | Action::GenerateRecipes
            | Action::GenerateClinicalSummary => Route {
                primary: TierRole::Logic,
                fallback: Some(TierRole::Lite),
            },
            Action::GenerateShoppingList => Route {
                primary: TierRole::Lite,
                fallback: Some(TierRole::Logic),
            },
            Action::Chat => Route {
                primary: TierRole::Lite,
                fallback: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_endpoint_layout() {
        let tier = ModelTier::gemini("https://example.test/v1beta/", "gemini-2.5-flash");
        assert_eq!(
            tier.endpoint,
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn analyze_food_uses_vision_pair() {
        let route = Route::for_action(Action::AnalyzeFood);
        assert_eq!(route.primary, TierRole::VisionPrimary);
        assert_eq!(route.fallback, Some(TierRole::VisionFallback));
    }

    #[test]
    fn chat_has_no_fallback() {
        assert_eq!(Route::for_action(Action::Chat).fallback, None);
    }
}
