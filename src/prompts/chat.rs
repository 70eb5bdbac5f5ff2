//! Nutrition assistant chat.

use std::fmt::Write;

use super::{CREATIVE_TEMPERATURE, describe_profile, with_clinical};
use crate::types::{ChatPayload, ChatRole, PromptSpec};

const SYSTEM: &str = "\
You are a friendly nutrition assistant inside a food-tracking app. Answer \
questions about food, meals, macronutrients and healthy habits in short, \
practical paragraphs. You are not a doctor: for symptoms, diagnoses or \
medication, tell the user to consult a health professional. Reply in the \
same language the user writes in.";

/// Prior turns kept in the prompt; older ones are dropped.
const MAX_HISTORY_TURNS: usize = 20;

pub fn build_chat(payload: &ChatPayload) -> PromptSpec {
    let mut system = with_clinical(SYSTEM, payload.clinical_mode);
    if let Some(profile) = &payload.profile {
        let described = describe_profile(profile);
        if !described.is_empty() {
            let _ = write!(system, "\n\nWhat you know about the user:\n{described}");
        }
    }

    let mut content = String::new();
    if !payload.history.is_empty() {
        let skip = payload.history.len().saturating_sub(MAX_HISTORY_TURNS);
        content.push_str("Conversation so far:\n");
        for turn in &payload.history[skip..] {
            let speaker = match turn.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Assistant",
            };
            let _ = writeln!(content, "{speaker}: {}", turn.content);
        }
        content.push('\n');
    }
    let _ = write!(content, "User: {}", payload.message);

    PromptSpec::text(content)
        .system(system)
        .temperature(CREATIVE_TEMPERATURE)
}
