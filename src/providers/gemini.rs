//! Gemini `generateContent` client.
//!
//! One POST per call to the tier's endpoint with the API key as the `key`
//! query parameter. See:
//! <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::traits::ModelClient;
use crate::types::{ModelTier, Part, PromptSpec};
use crate::{GatewayError, Result};

/// Default Gemini REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Markers that identify quota exhaustion in Gemini error payloads.
const QUOTA_MARKERS: &[&str] = &["resource_exhausted", "quota", "429"];

/// Client for the Gemini `generateContent` API.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    http: Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"[redacted]")
            .finish()
    }
}

impl GeminiClient {
    /// Create a client with the given API key.
    ///
    /// Only a connect timeout is set; the overall request deadline belongs
    /// to the hosting runtime.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "Gemini API key is empty".to_string(),
            ));
        }
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { api_key, http })
    }

    /// Serialise a prompt into the wire request body.
    fn request_body(prompt: &PromptSpec) -> GenerateRequest<'_> {
        let parts = prompt
            .content
            .iter()
            .map(|part| match part {
                Part::Text(text) => RequestPart::Text { text },
                Part::InlineImage { mime_type, data } => RequestPart::InlineData {
                    inline_data: InlineData { mime_type, data },
                },
            })
            .collect();

        let generation_config = if prompt.response_schema.is_some() || prompt.temperature.is_some()
        {
            Some(GenerationConfig {
                temperature: prompt.temperature,
                response_mime_type: prompt
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json"),
                response_schema: prompt.response_schema.as_ref(),
            })
        } else {
            None
        };

        GenerateRequest {
            contents: vec![RequestContent {
                role: Some("user"),
                parts,
            }],
            system_instruction: prompt.system_instruction.as_deref().map(|text| {
                RequestContent {
                    role: None,
                    parts: vec![RequestPart::Text { text }],
                }
            }),
            generation_config,
        }
    }

    /// Join the text parts of the first candidate.
    fn extract_text(response: GenerateResponse) -> Result<String> {
        let text: String = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Translate an upstream failure into a closed error kind.
///
/// This is the only place upstream error text is inspected.
pub(crate) fn classify_failure(status: Option<u16>, body: &str) -> GatewayError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.error);
    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| body.chars().take(500).collect());
    let status = status.or_else(|| detail.as_ref().and_then(|d| d.code));
    let upstream_status = detail.as_ref().and_then(|d| d.status.as_deref());

    let haystack = format!("{} {}", upstream_status.unwrap_or_default(), message).to_lowercase();
    if status == Some(429) || QUOTA_MARKERS.iter().any(|m| haystack.contains(m)) {
        GatewayError::QuotaExceeded(message)
    } else {
        GatewayError::Upstream { status, message }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, tier, prompt), fields(model = %tier.identifier))]
    async fn generate(&self, tier: &ModelTier, prompt: &PromptSpec) -> Result<String> {
        let response = self
            .http
            .post(&tier.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Http(e.without_url().to_string()))?;

        if !status.is_success() {
            let err = classify_failure(Some(status.as_u16()), &body);
            warn!(status = status.as_u16(), error = %err, "Gemini call failed");
            return Err(err);
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::MalformedResponse(format!("unreadable response: {e}")))?;
        if parsed.error.is_some() {
            return Err(classify_failure(None, &body));
        }

        debug!("received Gemini response");
        Self::extract_text(parsed)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<Value>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}
