//! Hosted chat-completion client for the diagnostics assistant.
//!
//! Wraps the generative-language `generateContent` REST endpoint. Every
//! question is prefixed with a fixed persona prompt; no conversation history
//! is kept; each call is independent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persona instruction prepended to every user question.
pub const SYSTEM_PROMPT: &str = "You are 'MechaMind,' an expert AI automotive assistant. \
Be concise, clear, and helpful. Explain potential causes and suggest a clear course of action. \
Do not answer questions unrelated to vehicles.";

/// Base URL of the hosted generative-language API.
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Assistant client errors.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("API response contained no text")]
    EmptyResponse,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the hosted chat model.
#[derive(Debug, Clone)]
pub struct Assistant {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Assistant {
    /// Create a client for the given credential and model name.
    pub fn new(api_key: &str, model: &str) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                crate::config::defaults::CHAT_HTTP_TIMEOUT_SECS,
            ))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Override the API base URL (e.g. a local stub in tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Send one question and return the model's reply text.
    pub async fn ask(&self, query: &str) -> Result<String, AssistantError> {
        let prompt = build_prompt(query);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AssistantError::Api { status, body });
        }

        let parsed: GenerateResponse = resp.json().await?;
        extract_text(parsed)
    }
}

/// Concatenate the persona prompt with the user's question.
fn build_prompt(query: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\nUser Question: {query}")
}

/// Pull the first candidate's text out of a response.
fn extract_text(resp: GenerateResponse) -> Result<String, AssistantError> {
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .filter(|t| !t.is_empty())
        .ok_or(AssistantError::EmptyResponse)
}
