//! Food photo analysis and free-text nutrition calculation.

use std::fmt::Write;

use serde_json::Value;

use super::schema::{
    array, boolean, enumeration, food_item, integer, macros, nullable, number, object, string,
};
use super::{STRUCTURED_TEMPERATURE, with_clinical};
use crate::types::{AnalyzeFoodPayload, CalculateNutritionPayload, Part, PromptSpec};

/// Error codes the vision model may return instead of an analysis.
pub const ANALYSIS_ERROR_CODES: &[&str] = &["NOT_FOOD", "UNCLEAR_IMAGE"];

const ANALYZE_SYSTEM: &str = "\
You are a nutritionist analysing a photo of a meal. Identify each food item, \
estimate its portion in grams and its calories, protein, carbohydrates, fat \
and fiber. Use typical home portions when unsure and lower your confidence. \
If the photo does not show food or drink, set isFood to false, set error to \
NOT_FOOD and return an empty item list. If the photo is too dark or blurry \
to analyse, set error to UNCLEAR_IMAGE. Respond only with JSON matching the \
schema.";

const NUTRITION_SYSTEM: &str = "\
You are a nutritionist. Break the described meal into individual foods, \
estimate realistic portions when quantities are missing, and compute calories \
and macronutrients for each item and for the whole meal. Respond only with \
JSON matching the schema.";

pub fn build_analyze_food(payload: &AnalyzeFoodPayload) -> PromptSpec {
    let mut text = String::from("Analyse the food in this photo.");
    if let Some(meal) = &payload.meal_type {
        let _ = write!(text, " The user logged it as {meal}.");
    }
    if let Some(notes) = payload.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = write!(text, "\nUser notes: {notes}");
    }

    PromptSpec::default()
        .system(with_clinical(ANALYZE_SYSTEM, payload.clinical_mode))
        .part(Part::InlineImage {
            mime_type: payload.image.mime_type.clone(),
            data: payload.image.base64.clone(),
        })
        .part(Part::text(text))
        .schema(analysis_schema(payload.clinical_mode))
        .temperature(STRUCTURED_TEMPERATURE)
}

fn analysis_schema(clinical_mode: bool) -> Value {
    let mut props = vec![
        ("isFood", boolean()),
        ("error", nullable(enumeration(ANALYSIS_ERROR_CODES))),
        ("mealName", string()),
        ("items", array(food_item())),
        ("totals", macros(true)),
        ("confidence", enumeration(&["low", "medium", "high"])),
        ("healthScore", integer()),
        ("notes", string()),
    ];
    if clinical_mode {
        props.push(("clinicalAlerts", array(string())));
    }
    object(props, &["isFood", "items", "totals", "confidence"])
}

pub fn build_calculate_nutrition(payload: &CalculateNutritionPayload) -> PromptSpec {
    let mut text = format!("Meal description: {}", payload.description.trim());
    if let Some(servings) = payload.servings {
        let _ = write!(text, "\nNumber of servings eaten: {servings}");
    }

    PromptSpec::text(text)
        .system(NUTRITION_SYSTEM)
        .schema(object(
            vec![
                ("items", array(food_item())),
                ("totals", macros(true)),
                ("servings", number()),
                ("notes", string()),
            ],
            &["items", "totals"],
        ))
        .temperature(STRUCTURED_TEMPERATURE)
}
