//! Prompt and schema builders, one per action.
//!
//! Every builder is a pure function from a validated payload to a
//! [`PromptSpec`]: system instruction, content parts and (for structured
//! actions) a response schema. No I/O happens here.

mod chat;
mod clinical;
mod food;
mod planning;
pub(crate) mod schema;

use std::fmt::Write;

use crate::types::{ActionPayload, PromptSpec, UserProfile};

pub use chat::build_chat;
pub use clinical::build_clinical_summary;
pub use food::{build_analyze_food, build_calculate_nutrition};
pub use planning::{build_meal_plan, build_recipes, build_shopping_list};

/// Temperature for structured, factual answers.
pub(crate) const STRUCTURED_TEMPERATURE: f32 = 0.2;

/// Temperature for creative generation (plans, recipes, chat).
pub(crate) const CREATIVE_TEMPERATURE: f32 = 0.7;

/// Extra guidance appended when the user is under medical supervision.
pub(crate) const CLINICAL_GUIDANCE: &str = "\
CLINICAL MODE: this user follows a plan supervised by a health professional. \
Be conservative, flag foods that conflict with the listed conditions, never \
suggest changes to medication or prescribed diets, and recommend confirming \
any significant change with the supervising professional.";

/// Build the model request for a validated payload.
pub fn build(payload: &ActionPayload) -> PromptSpec {
    match payload {
        ActionPayload::Chat(p) => build_chat(p),
        ActionPayload::AnalyzeFood(p) => build_analyze_food(p),
        ActionPayload::CalculateNutrition(p) => build_calculate_nutrition(p),
        ActionPayload::GenerateMealPlan(p) => build_meal_plan(p),
        ActionPayload::GenerateRecipes(p) => build_recipes(p),
        ActionPayload::GenerateShoppingList(p) => build_shopping_list(p),
        ActionPayload::GenerateClinicalSummary(p) => build_clinical_summary(p),
    }
}

/// Render the known profile fields as a bullet list; empty if nothing is known.
pub(crate) fn describe_profile(profile: &UserProfile) -> String {
    let mut out = String::new();
    if let Some(age) = profile.age {
        let _ = writeln!(out, "- Age: {age}");
    }
    if let Some(sex) = &profile.sex {
        let _ = writeln!(out, "- Sex: {sex}");
    }
    if let Some(weight) = profile.weight_kg {
        let _ = writeln!(out, "- Weight: {weight} kg");
    }
    if let Some(height) = profile.height_cm {
        let _ = writeln!(out, "- Height: {height} cm");
    }
    if let Some(goal) = &profile.goal {
        let _ = writeln!(out, "- Goal: {goal}");
    }
    if let Some(level) = &profile.activity_level {
        let _ = writeln!(out, "- Activity level: {level}");
    }
    push_list(&mut out, "Dietary restrictions", &profile.dietary_restrictions);
    push_list(&mut out, "Allergies", &profile.allergies);
    push_list(&mut out, "Health conditions", &profile.conditions);
    out
}

fn push_list(out: &mut String, label: &str, items: &[String]) {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !items.is_empty() {
        let _ = writeln!(out, "- {label}: {}", items.join(", "));
    }
}

/// Append clinical guidance to a system instruction when requested.
pub(crate) fn with_clinical(system: &str, clinical_mode: bool) -> String {
    if clinical_mode {
        format!("{system}\n\n{CLINICAL_GUIDANCE}")
    } else {
        system.to_string()
    }
}
