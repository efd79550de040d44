//! Gemini provider implementation.
//!
//! Calls the `generateContent` REST endpoint directly over HTTPS.

use super::{GenerationParams, GenerationResult, ProviderError, TextProvider};
use crate::models::TokenUsage;
use crate::services::chart::compose_prompt;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Header carrying the API key, keeping it out of URLs and logs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<Secret<String>>,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    params: GenerationParams,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            params: GenerationParams::default(),
            client,
        })
    }

    /// Build the API URL for the given model method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().as_str())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("API key not provided".to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.config.timeout)
        } else {
            ProviderError::Network(err.to_string())
        }
    }

    fn build_request(&self, full_prompt: String) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: full_prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.params.temperature,
                max_output_tokens: self.params.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        chart: &Value,
    ) -> Result<GenerationResult, ProviderError> {
        let api_key = self.api_key()?;
        let full_prompt = compose_prompt(prompt, chart)?;
        let prompt_len = full_prompt.len();
        let request = self.build_request(full_prompt);

        tracing::debug!(
            model = %self.config.model,
            prompt_len,
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let api_response: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))?;

        extract_generation(api_response)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.api_key().map(|_| ())
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// First text part of the first candidate, plus usage when reported.
fn extract_generation(
    response: GenerateContentResponse,
) -> Result<GenerationResult, ProviderError> {
    let usage = response.usage_metadata.map(TokenUsage::from);

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text.unwrap_or_default())
        .ok_or(ProviderError::EmptyResponse)?;

    Ok(GenerationResult {
        text: text.trim().to_string(),
        usage,
    })
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    // Absent when a candidate is blocked before producing output.
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
    #[serde(default)]
    total_token_count: Option<u32>,
}

impl From<UsageMetadata> for TokenUsage {
    fn from(usage: UsageMetadata) -> Self {
        let prompt_tokens = usage.prompt_token_count.unwrap_or(0);
        let completion_tokens = usage.candidates_token_count.unwrap_or(0);
        TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: usage
                .total_token_count
                .unwrap_or(prompt_tokens.saturating_add(completion_tokens)),
        }
    }
}
