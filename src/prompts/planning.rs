//! Meal plans, recipes and shopping lists.

use std::fmt::Write;

use super::schema::{array, enumeration, integer, macros, number, object, string};
use super::{CREATIVE_TEMPERATURE, STRUCTURED_TEMPERATURE, describe_profile, with_clinical};
use crate::types::{MealPlanPayload, PromptSpec, RecipesPayload, ShoppingListPayload};

const MEAL_TYPES: &[&str] = &[
    "breakfast",
    "morning-snack",
    "lunch",
    "afternoon-snack",
    "dinner",
    "supper",
];

const MEAL_PLAN_SYSTEM: &str = "\
You are a nutritionist building a practical meal plan with affordable, \
everyday foods. Respect every restriction and allergy, keep daily totals \
close to the calorie target, and vary meals across days. Respond only with \
JSON matching the schema.";

const RECIPES_SYSTEM: &str = "\
You are a chef who cooks healthy home meals. Create recipes that mainly use \
the listed ingredients plus common pantry staples, respect every restriction, \
and give nutrition per serving. Respond only with JSON matching the schema.";

const SHOPPING_SYSTEM: &str = "\
You turn meal plans into a consolidated shopping list. Merge duplicate \
ingredients, convert to purchasable quantities and group items by store \
section. Respond only with JSON matching the schema.";

pub fn build_meal_plan(payload: &MealPlanPayload) -> PromptSpec {
    let mut text = format!("Create a {}-day meal plan.", payload.days);
    if let Some(kcal) = payload.target_calories {
        let _ = write!(text, "\nDaily calorie target: {kcal} kcal");
    }
    if let Some(profile) = &payload.profile {
        let described = describe_profile(profile);
        if !described.is_empty() {
            let _ = write!(text, "\nUser profile:\n{described}");
        }
    }
    if payload.clinical_mode
        && let Some(notes) = payload.clinical_notes.as_deref()
    {
        let _ = write!(text, "\nNotes from the supervising professional: {notes}");
    }

    let meal = object(
        vec![
            ("type", enumeration(MEAL_TYPES)),
            ("name", string()),
            ("description", string()),
            ("calories", number()),
            ("protein", number()),
            ("carbs", number()),
            ("fat", number()),
        ],
        &["type", "name", "calories", "protein", "carbs", "fat"],
    );
    let day = object(
        vec![
            ("day", integer()),
            ("meals", array(meal)),
            ("totalCalories", number()),
        ],
        &["day", "meals", "totalCalories"],
    );

    PromptSpec::text(text)
        .system(with_clinical(MEAL_PLAN_SYSTEM, payload.clinical_mode))
        .schema(object(
            vec![("days", array(day)), ("tips", array(string()))],
            &["days"],
        ))
        .temperature(CREATIVE_TEMPERATURE)
}

pub fn build_recipes(payload: &RecipesPayload) -> PromptSpec {
    let ingredients: Vec<&str> = payload
        .ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    let mut text = format!(
        "Suggest {} recipe(s) using: {}.",
        payload.count,
        ingredients.join(", ")
    );
    if let Some(meal) = &payload.meal_type {
        let _ = write!(text, "\nMeal: {meal}");
    }
    if !payload.restrictions.is_empty() {
        let _ = write!(text, "\nRestrictions: {}", payload.restrictions.join(", "));
    }
    if let Some(kcal) = payload.target_calories {
        let _ = write!(text, "\nAim for about {kcal} kcal per serving.");
    }

    let recipe = object(
        vec![
            ("title", string()),
            ("mealType", enumeration(MEAL_TYPES)),
            ("prepMinutes", integer()),
            ("servings", integer()),
            ("difficulty", enumeration(&["easy", "medium", "hard"])),
            (
                "ingredients",
                array(object(
                    vec![("name", string()), ("quantity", string())],
                    &["name", "quantity"],
                )),
            ),
            ("steps", array(string())),
            ("nutritionPerServing", macros(false)),
        ],
        &[
            "title",
            "prepMinutes",
            "servings",
            "ingredients",
            "steps",
            "nutritionPerServing",
        ],
    );

    PromptSpec::text(text)
        .system(RECIPES_SYSTEM)
        .schema(object(vec![("recipes", array(recipe))], &["recipes"]))
        .temperature(CREATIVE_TEMPERATURE)
}

pub fn build_shopping_list(payload: &ShoppingListPayload) -> PromptSpec {
    let mut text = format!("Meal plan:\n{}", payload.meal_plan);
    if let Some(servings) = payload.servings {
        let _ = write!(text, "\nScale quantities for {servings} people.");
    }

    let item = object(
        vec![
            ("name", string()),
            ("quantity", string()),
            ("notes", string()),
        ],
        &["name", "quantity"],
    );
    let category = object(
        vec![
            (
                "name",
                enumeration(&[
                    "produce",
                    "proteins",
                    "dairy",
                    "grains",
                    "pantry",
                    "frozen",
                    "beverages",
                    "other",
                ]),
            ),
            ("items", array(item)),
        ],
        &["name", "items"],
    );

    PromptSpec::text(text)
        .system(SHOPPING_SYSTEM)
        .schema(object(
            vec![
                ("categories", array(category)),
                ("estimatedItems", integer()),
            ],
            &["categories"],
        ))
        .temperature(STRUCTURED_TEMPERATURE)
}
