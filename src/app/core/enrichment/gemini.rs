// SPDX-License-Identifier: GPL-3.0

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{ContextError, ContextField, ContextProvider};
use crate::app::core::models::Language;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_API_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// [`ContextProvider`] calling the Gemini `generateContent` endpoint with a JSON response schema
#[derive(Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_endpoint: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ContextProvider for GeminiProvider {
    async fn generate(&self, word: &str, language: Language) -> Result<String, ContextError> {
        if self.api_key.trim().is_empty() {
            return Err(ContextError::NotConfigured);
        }

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(word, language))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ContextError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        let response: GenerateContentResponse = serde_json::from_slice(&bytes)?;
        response.text().ok_or(ContextError::Empty)
    }
}

pub(crate) fn prompt(word: &str, language: Language) -> String {
    format!(
        "Provide context for the {language} word \"{word}\". Give me a simple sample sentence, \
         its English translation, and a brief explanation."
    )
}

/// Object schema with one required string property per [`ContextField`]
pub fn response_schema(language: Language) -> Value {
    let properties: Map<String, Value> = ContextField::ALL
        .iter()
        .map(|field| {
            (
                field.key().to_string(),
                json!({ "type": "STRING", "description": field.description(language) }),
            )
        })
        .collect();
    let required: Vec<&str> = ContextField::ALL.iter().map(|field| field.key()).collect();

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}

pub(crate) fn request_body(word: &str, language: Language) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt(word, language) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(language),
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate joined together
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
