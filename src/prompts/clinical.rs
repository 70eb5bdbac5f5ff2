//! Summary of a patient's food log for a supervising professional.

use std::fmt::Write;

use super::schema::{array, enumeration, macros, object, string};
use super::{CLINICAL_GUIDANCE, STRUCTURED_TEMPERATURE};
use crate::types::{ClinicalSummaryPayload, PromptSpec};

/// Log records beyond this are dropped from the prompt, newest kept.
const MAX_ENTRIES: usize = 200;

const SYSTEM: &str = "\
You write concise clinical nutrition summaries for dietitians. Base every \
statement on the food log provided; do not invent data. Report daily \
averages, adherence to the stated goals, notable trends and concerns, and \
concrete recommendations. Respond only with JSON matching the schema.";

pub fn build_clinical_summary(payload: &ClinicalSummaryPayload) -> PromptSpec {
    let mut text = String::new();
    if let Some(name) = &payload.patient_name {
        let _ = writeln!(text, "Patient: {name}");
    }
    let _ = writeln!(text, "Period: last {} days", payload.period_days);
    if let Some(goals) = &payload.goals {
        let _ = writeln!(text, "Goals: {goals}");
    }
    if let Some(notes) = &payload.notes {
        let _ = writeln!(text, "Professional notes: {notes}");
    }

    let skip = payload.entries.len().saturating_sub(MAX_ENTRIES);
    let _ = writeln!(text, "Food log ({} records):", payload.entries.len() - skip);
    for entry in &payload.entries[skip..] {
        let _ = writeln!(text, "{entry}");
    }

    PromptSpec::text(text)
        .system(format!("{SYSTEM}\n\n{CLINICAL_GUIDANCE}"))
        .schema(object(
            vec![
                ("summary", string()),
                ("adherence", enumeration(&["low", "moderate", "high"])),
                ("dailyAverages", macros(true)),
                ("trends", array(string())),
                ("concerns", array(string())),
                ("recommendations", array(string())),
            ],
            &["summary", "adherence", "dailyAverages", "recommendations"],
        ))
        .temperature(STRUCTURED_TEMPERATURE)
}
