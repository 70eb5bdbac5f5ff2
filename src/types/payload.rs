//! Typed, validated payloads for every action.
//!
//! Inbound payloads arrive as untyped JSON. [`ActionPayload::parse`] turns
//! them into one of the explicit schemas below and rejects anything
//! malformed with a `Validation` error before any network call is made.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Action;
use crate::{GatewayError, Result};

/// Longest chat message accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4_000;

/// Largest decoded food photo accepted, in bytes.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Basic user profile forwarded by the app for personalised prompts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub age: Option<u32>,
    pub sex: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub goal: Option<String>,
    pub activity_level: Option<String>,
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub conditions: Vec<String>,
}

/// Speaker of a prior chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model")]
    Assistant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub clinical_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalyzeFood {
    image: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    meal_type: Option<String>,
    #[serde(default)]
    clinical_mode: bool,
    #[serde(default)]
    notes: Option<String>,
}

/// A decoded food photo.
#[derive(Debug, Clone)]
pub struct FoodImage {
    pub mime_type: String,
    /// Base64 form, forwarded to the model as inline data.
    pub base64: String,
    /// Decoded bytes, used for content hashing.
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AnalyzeFoodPayload {
    pub image: FoodImage,
    pub meal_type: Option<String>,
    pub clinical_mode: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateNutritionPayload {
    pub description: String,
    #[serde(default)]
    pub servings: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanPayload {
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub target_calories: Option<u32>,
    #[serde(default = "default_plan_days")]
    pub days: u8,
    #[serde(default)]
    pub clinical_mode: bool,
    #[serde(default)]
    pub clinical_notes: Option<String>,
}

fn default_plan_days() -> u8 {
    7
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipesPayload {
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default = "default_recipe_count")]
    pub count: u8,
    #[serde(default)]
    pub target_calories: Option<u32>,
}

fn default_recipe_count() -> u8 {
    3
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListPayload {
    pub meal_plan: Value,
    #[serde(default)]
    pub servings: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalSummaryPayload {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default = "default_period_days")]
    pub period_days: u32,
    pub entries: Vec<Value>,
    #[serde(default)]
    pub goals: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_period_days() -> u32 {
    30
}

/// A validated payload, one variant per [`Action`].
#[derive(Debug, Clone)]
pub enum ActionPayload {
    Chat(ChatPayload),
    AnalyzeFood(AnalyzeFoodPayload),
    CalculateNutrition(CalculateNutritionPayload),
    GenerateMealPlan(MealPlanPayload),
    GenerateRecipes(RecipesPayload),
    GenerateShoppingList(ShoppingListPayload),
    GenerateClinicalSummary(ClinicalSummaryPayload),
}

impl ActionPayload {
    /// Decode and validate an untyped payload for `action`.
    pub fn parse(action: Action, payload: Value) -> Result<Self> {
        if !payload.is_object() {
            return Err(GatewayError::Validation(
                "payload must be a JSON object".to_string(),
            ));
        }
        match action {
            Action::Chat => {
                let p: ChatPayload = decode(action, payload)?;
                require_text("message", &p.message)?;
                if p.message.chars().count() > MAX_MESSAGE_CHARS {
                    return Err(GatewayError::Validation(format!(
                        "message exceeds {MAX_MESSAGE_CHARS} characters"
                    )));
                }
                Ok(ActionPayload::Chat(p))
            }
            Action::AnalyzeFood => {
                let raw: RawAnalyzeFood = decode(action, payload)?;
                let image = decode_image(&raw.image, raw.mime_type.as_deref())?;
                Ok(ActionPayload::AnalyzeFood(AnalyzeFoodPayload {
                    image,
                    meal_type: raw.meal_type,
                    clinical_mode: raw.clinical_mode,
                    notes: raw.notes,
                }))
            }
            Action::CalculateNutrition => {
                let p: CalculateNutritionPayload = decode(action, payload)?;
                require_text("description", &p.description)?;
                if p.servings.is_some_and(|s| !(s.is_finite() && s > 0.0)) {
                    return Err(GatewayError::Validation(
                        "servings must be a positive number".to_string(),
                    ));
                }
                Ok(ActionPayload::CalculateNutrition(p))
            }
            Action::GenerateMealPlan => {
                let p: MealPlanPayload = decode(action, payload)?;
                if !(1..=7).contains(&p.days) {
                    return Err(GatewayError::Validation(
                        "days must be between 1 and 7".to_string(),
                    ));
                }
                Ok(ActionPayload::GenerateMealPlan(p))
            }
            Action::GenerateRecipes => {
                let p: RecipesPayload = decode(action, payload)?;
                if p.ingredients.iter().all(|i| i.trim().is_empty()) {
                    return Err(GatewayError::Validation(
                        "at least one ingredient is required".to_string(),
                    ));
                }
                if !(1..=5).contains(&p.count) {
                    return Err(GatewayError::Validation(
                        "count must be between 1 and 5".to_string(),
                    ));
                }
                Ok(ActionPayload::GenerateRecipes(p))
            }
            Action::GenerateShoppingList => {
                let p: ShoppingListPayload = decode(action, payload)?;
                if p.meal_plan.is_null() {
                    return Err(GatewayError::Validation("mealPlan is required".to_string()));
                }
                Ok(ActionPayload::GenerateShoppingList(p))
            }
            Action::GenerateClinicalSummary => {
                let p: ClinicalSummaryPayload = decode(action, payload)?;
                if p.entries.is_empty() {
                    return Err(GatewayError::Validation(
                        "entries must contain at least one record".to_string(),
                    ));
                }
                Ok(ActionPayload::GenerateClinicalSummary(p))
            }
        }
    }

    pub fn action(&self) -> Action {
        match self {
            ActionPayload::Chat(_) => Action::Chat,
            ActionPayload::AnalyzeFood(_) => Action::AnalyzeFood,
            ActionPayload::CalculateNutrition(_) => Action::CalculateNutrition,
            ActionPayload::GenerateMealPlan(_) => Action::GenerateMealPlan,
            ActionPayload::GenerateRecipes(_) => Action::GenerateRecipes,
            ActionPayload::GenerateShoppingList(_) => Action::GenerateShoppingList,
            ActionPayload::GenerateClinicalSummary(_) => Action::GenerateClinicalSummary,
        }
    }
}

fn decode<T: DeserializeOwned>(action: Action, payload: Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| GatewayError::Validation(format!("invalid payload for '{action}': {e}")))
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Accepts raw base64 or a `data:<mime>;base64,<data>` URL.
fn decode_image(image: &str, mime_type: Option<&str>) -> Result<FoodImage> {
    let (url_mime, data) = match image.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',').ok_or_else(|| {
                GatewayError::Validation("image data URL is missing its data".to_string())
            })?;
            let mime = header.strip_suffix(";base64").ok_or_else(|| {
                GatewayError::Validation("image data URL must be base64 encoded".to_string())
            })?;
            (Some(mime), data)
        }
        None => (None, image),
    };

    let mime_type = mime_type
        .or(url_mime)
        .unwrap_or("image/jpeg")
        .to_ascii_lowercase();
    if !ALLOWED_IMAGE_TYPES.contains(&mime_type.as_str()) {
        return Err(GatewayError::Validation(format!(
            "unsupported image type '{mime_type}'"
        )));
    }

    let data = data.trim();
    if data.is_empty() {
        return Err(GatewayError::Validation("image must not be empty".to_string()));
    }
    let bytes = STANDARD
        .decode(data)
        .map_err(|_| GatewayError::Validation("image is not valid base64".to_string()))?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(GatewayError::Validation(format!(
            "image exceeds {} MiB",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }

    Ok(FoodImage {
        mime_type,
        base64: data.to_string(),
        bytes,
    })
}
