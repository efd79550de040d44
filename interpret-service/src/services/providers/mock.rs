//! Mock provider for local runs and tests.

use super::{GenerationResult, ProviderError, TextProvider};
use crate::models::TokenUsage;
use crate::services::chart::compose_prompt;
use async_trait::async_trait;
use serde_json::Value;

/// Echoes the composed prompt back as the interpretation.
pub struct MockTextProvider {
    enabled: bool,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn ensure_enabled(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        chart: &Value,
    ) -> Result<GenerationResult, ProviderError> {
        self.ensure_enabled()?;

        let full_prompt = compose_prompt(prompt, chart)?;
        let prompt_tokens = (full_prompt.len() / 4) as u32;
        let completion_tokens = 10;

        Ok(GenerationResult {
            text: format!("Mock interpretation for: {}", full_prompt)
                .trim()
                .to_string(),
            usage: Some(TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.ensure_enabled()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
