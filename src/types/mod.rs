//! Public types for the gateway API.

mod action;
mod payload;
mod prompt;
mod request;
mod tier;

pub use action::Action;
pub use payload::{
    ActionPayload, AnalyzeFoodPayload, CalculateNutritionPayload, ChatPayload, ChatRole, ChatTurn,
    ClinicalSummaryPayload, FoodImage, MAX_IMAGE_BYTES, MAX_MESSAGE_CHARS, MealPlanPayload,
    RecipesPayload, ShoppingListPayload, UserProfile,
};
pub use prompt::{Part, PromptSpec};
pub use request::{ActionRequest, ClientIdentity, RawActionRequest};
pub use tier::{
    DEFAULT_LITE_MODEL, DEFAULT_LOGIC_MODEL, DEFAULT_VISION_FALLBACK_MODEL,
    DEFAULT_VISION_PRIMARY_MODEL, ModelTier, ModelTiers, Route, TierRole,
};
