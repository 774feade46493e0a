//! Client for the external text-generation service.
//!
//! Total by contract: [`InsightsClient::generate_insights`] always returns
//! a string. A missing credential, transport failure, non-success status or
//! empty response each map to a fixed fallback text; nothing is retried and
//! nothing here can fail the numeric pipeline.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::prompt::{build_insights_prompt, clean_response};
use pulse_data::aggregator::AggregationResult;

/// Environment variable holding the generation-service API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Shown when no API key is configured.
pub const FALLBACK_UNCONFIGURED: &str = "Configure your API Key to enable AI insights.";
/// Shown when the request fails or the service answers with an error.
pub const FALLBACK_UNAVAILABLE: &str = "AI Insights temporarily unavailable.";
/// Shown when the service answers successfully but with empty text.
pub const FALLBACK_EMPTY: &str = "Could not generate insights.";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const MODEL: &str = "gemini-2.5-flash";

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Error)]
enum InsightsError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation request failed with status {0}")]
    Status(reqwest::StatusCode),
}

// ── InsightsClient ────────────────────────────────────────────────────────────

/// HTTP client for the narrative-summary service.
pub struct InsightsClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl InsightsClient {
    /// Create a client with an explicit (possibly absent) API key.
    pub fn new(api_key: Option<String>) -> Self {
        InsightsClient {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a client configured from the [`API_KEY_ENV`] environment
    /// variable; a blank value counts as unconfigured.
    pub fn from_env() -> Self {
        Self::new(std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }

    /// Override the service base URL (used for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Generate the narrative summary for an aggregation result.
    ///
    /// Callers render the numeric output first and invoke this afterwards,
    /// at most once per filter state; the returned text is display-ready.
    pub async fn generate_insights(&self, result: &AggregationResult) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("No API key configured for insights generation");
            return FALLBACK_UNCONFIGURED.to_string();
        };

        let prompt = build_insights_prompt(result);
        match self.request(api_key, &prompt).await {
            Ok(text) if !text.trim().is_empty() => clean_response(&text),
            Ok(_) => FALLBACK_EMPTY.to_string(),
            Err(e) => {
                warn!("Insights generation failed: {}", e);
                FALLBACK_UNAVAILABLE.to_string()
            }
        }
    }

    async fn request(&self, api_key: &str, prompt: &str) -> Result<String, InsightsError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, MODEL
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InsightsError::Status(response.status()));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
