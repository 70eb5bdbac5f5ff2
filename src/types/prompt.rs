//! Model-ready request produced by the prompt builders.

use serde_json::Value;

/// One piece of request content.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Base64-encoded image bytes.
    InlineImage { mime_type: String, data: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }
}

/// A model-ready request: optional system instruction, content parts and an
/// optional structured-output schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PromptSpec {
    pub system_instruction: Option<String>,
    pub content: Vec<Part>,
    pub response_schema: Option<Value>,
    pub temperature: Option<f32>,
}

impl PromptSpec {
    /// Text-only prompt.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![Part::Text(content.into())],
            ..Self::default()
        }
    }

    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn part(mut self, part: Part) -> Self {
        self.content.push(part);
        self
    }

    /// Whether the model is asked for JSON output.
    pub fn expects_json(&self) -> bool {
        self.response_schema.is_some()
    }

    /// Concatenated text parts, for logging and tests.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineImage { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
