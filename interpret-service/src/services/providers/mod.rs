//! Text generation provider abstractions and implementations.
//!
//! The request handler only sees [`TextProvider`]; the transport behind it
//! (raw HTTPS to Gemini, or the mock) is chosen at startup.

pub mod gemini;
pub mod mock;

use crate::models::TokenUsage;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("failed to marshal chart data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to call generation API: {0}")]
    Network(String),

    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("no content in API response")]
    EmptyResponse,
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Serialization(_) => "serialization",
            ProviderError::Network(_) => "network",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Api { .. } => "api",
            ProviderError::Parse(_) => "parse",
            ProviderError::EmptyResponse => "empty_response",
        }
    }
}

/// Output of one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Generated text, whitespace-trimmed.
    pub text: String,

    /// Present only when the provider reported usage.
    pub usage: Option<TokenUsage>,
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 8192,
        }
    }
}

/// A backend that turns a prompt template plus chart data into an interpretation.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Compose the full prompt from `prompt` and `chart` and generate text for it.
    async fn generate(&self, prompt: &str, chart: &Value)
        -> Result<GenerationResult, ProviderError>;

    /// Configuration check; performs no network I/O.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Name used in logs and health output.
    fn name(&self) -> &'static str;
}
