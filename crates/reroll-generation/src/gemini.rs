//! Gemini REST client for turn generation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reroll_story::TurnContent;
use serde::{Deserialize, Serialize};

use crate::generator::{GenerationError, TurnGenerator};
use crate::prompt;
use crate::request::TurnRequest;

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for turn generation.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Client for the Gemini `generateContent` API, requesting JSON output.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Creates a client against the default endpoint.
    #[must_use]
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(DEFAULT_GEMINI_BASE_URL, api_key, model)
    }

    /// Creates a client against a custom endpoint (used by tests).
    #[must_use]
    pub fn with_base_url(base_url: &str, api_key: &str, model: &str) -> Self {
        // Generation calls can be slow; allow well over typical latency.
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: model.to_owned(),
            api_key: api_key.to_owned(),
        }
    }

    /// Creates a client from `GEMINI_API_KEY`, `GEMINI_MODEL`, and
    /// `GEMINI_BASE_URL`, falling back to defaults for the latter two.
    ///
    /// # Errors
    ///
    /// Returns an error message when `GEMINI_API_KEY` is unset.
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| "GEMINI_API_KEY environment variable must be set".to_owned())?;
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_owned());
        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_owned());
        Ok(Self::with_base_url(&base_url, &api_key, &model))
    }
}

#[async_trait]
impl TurnGenerator for GeminiClient {
    async fn generate_turn(&self, request: &TurnRequest) -> Result<TurnContent, GenerationError> {
        let api_request = GenerateContentRequest {
            system_instruction: ContentBlock {
                parts: vec![Part {
                    text: prompt::system_prompt(request).to_owned(),
                }],
            },
            contents: vec![ContentBlock {
                parts: vec![Part {
                    text: prompt::user_prompt(request),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_owned(),
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::RequestFailed(format!(
                "generator returned {status}: {body}"
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        parse_content(&api_response)
    }
}

/// Extracts and schema-validates the turn content from a raw API response.
fn parse_content(response: &GenerateContentResponse) -> Result<TurnContent, GenerationError> {
    let text = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.parts.first())
        .map(|part| part.text.as_str())
        .ok_or_else(|| {
            GenerationError::InvalidResponse("no candidates in generator response".to_owned())
        })?;

    serde_json::from_str(text)
        .map_err(|e| GenerationError::InvalidResponse(format!("turn content schema: {e}")))
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    #[serde(rename = "system_instruction")]
    system_instruction: ContentBlock,
    contents: Vec<ContentBlock>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentBlock {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ContentBlock,
}
