use serde::Serialize;
use std::time::Duration;

/// Provider-reported token counts for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Successful `POST /interpret` response.
///
/// Failures use [`service_core::error::ErrorEnvelope`], which carries
/// `success: false` and `error` instead of `interpretation`.
#[derive(Debug, Clone, Serialize)]
pub struct InterpretResponse {
    pub interpretation: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<String>,
}

impl InterpretResponse {
    pub fn new(interpretation: String, token_usage: Option<TokenUsage>, elapsed: Duration) -> Self {
        Self {
            interpretation,
            success: true,
            token_usage,
            processing_time: Some(format_processing_time(elapsed)),
        }
    }
}

/// Seconds with two decimals, e.g. `"1.23s"`.
pub fn format_processing_time(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_time_has_two_decimals() {
        assert_eq!(format_processing_time(Duration::from_millis(1234)), "1.23s");
        assert_eq!(format_processing_time(Duration::ZERO), "0.00s");
        assert_eq!(format_processing_time(Duration::from_secs(30)), "30.00s");
    }

    #[test]
    fn success_envelope_shape() {
        let usage = TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
        };
        let body = serde_json::to_value(InterpretResponse::new(
            "Your chart...".to_string(),
            Some(usage),
            Duration::from_millis(500),
        ))
        .unwrap();

        assert_eq!(body["success"], true);
        assert_eq!(body["interpretation"], "Your chart...");
        assert_eq!(body["token_usage"]["total_tokens"], 30);
        assert_eq!(body["processing_time"], "0.50s");
        assert!(body.get("error").is_none());
    }

    #[test]
    fn usage_is_omitted_when_unknown() {
        let body = serde_json::to_value(InterpretResponse::new(
            "text".to_string(),
            None,
            Duration::from_secs(1),
        ))
        .unwrap();
        assert!(body.get("token_usage").is_none());
    }
}
