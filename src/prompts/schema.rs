//! Structured-output schema fragments (Gemini OpenAPI subset).

use serde_json::{Map, Value, json};

pub(crate) fn string() -> Value {
    json!({ "type": "STRING" })
}

pub(crate) fn number() -> Value {
    json!({ "type": "NUMBER" })
}

pub(crate) fn integer() -> Value {
    json!({ "type": "INTEGER" })
}

pub(crate) fn boolean() -> Value {
    json!({ "type": "BOOLEAN" })
}

/// Bounded string field.
pub(crate) fn enumeration(values: &[&str]) -> Value {
    json!({ "type": "STRING", "enum": values })
}

pub(crate) fn nullable(mut schema: Value) -> Value {
    if let Some(obj) = schema.as_object_mut() {
        obj.insert("nullable".to_string(), Value::Bool(true));
    }
    schema
}

pub(crate) fn array(items: Value) -> Value {
    json!({ "type": "ARRAY", "items": items })
}

/// Object schema; `properties` keeps insertion order via `propertyOrdering`.
pub(crate) fn object(properties: Vec<(&str, Value)>, required: &[&str]) -> Value {
    let ordering: Vec<&str> = properties.iter().map(|(k, _)| *k).collect();
    let props: Map<String, Value> = properties
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    json!({
        "type": "OBJECT",
        "properties": props,
        "propertyOrdering": ordering,
        "required": required,
    })
}

/// Calories and macronutrients, in kcal and grams.
pub(crate) fn macros(with_fiber: bool) -> Value {
    let mut props = vec![
        ("calories", number()),
        ("protein", number()),
        ("carbs", number()),
        ("fat", number()),
    ];
    if with_fiber {
        props.push(("fiber", number()));
    }
    object(props, &["calories", "protein", "carbs", "fat"])
}

/// One identified or estimated food item.
pub(crate) fn food_item() -> Value {
    object(
        vec![
            ("name", string()),
            ("portion", string()),
            ("grams", number()),
            ("calories", number()),
            ("protein", number()),
            ("carbs", number()),
            ("fat", number()),
            ("fiber", number()),
        ],
        &["name", "portion", "calories", "protein", "carbs", "fat"],
    )
}
