//! Failures of the `/interpret` pipeline and their HTTP mapping.

use crate::services::providers::ProviderError;
use crate::services::PromptError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use service_core::error::ErrorEnvelope;
use thiserror::Error;

/// Every way one interpretation request can fail.
///
/// `Display` is the message returned to the caller; sources are logged.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Failed to read request body")]
    BodyRead(#[source] axum::Error),

    #[error("Invalid JSON format")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Failed to load prompt template")]
    PromptTemplate(#[source] PromptError),

    #[error("Failed to generate interpretation: {0}")]
    Generation(#[source] ProviderError),
}

impl InterpretError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            InterpretError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            InterpretError::BodyRead(_) | InterpretError::InvalidJson(_) => {
                StatusCode::BAD_REQUEST
            }
            InterpretError::PromptTemplate(_) | InterpretError::Generation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Pipeline stage that failed, used as the metrics outcome label.
    pub fn stage(&self) -> &'static str {
        match self {
            InterpretError::MethodNotAllowed => "method_not_allowed",
            InterpretError::BodyRead(_) => "body_read",
            InterpretError::InvalidJson(_) => "invalid_json",
            InterpretError::PromptTemplate(_) => "prompt_template",
            InterpretError::Generation(_) => "generation",
        }
    }
}

impl IntoResponse for InterpretError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            InterpretError::MethodNotAllowed => {
                tracing::warn!(status = status.as_u16(), "Rejected non-POST request");
            }
            InterpretError::BodyRead(source) => {
                tracing::warn!(status = status.as_u16(), error = %source, "{}", self);
            }
            InterpretError::InvalidJson(source) => {
                tracing::warn!(status = status.as_u16(), error = %source, "{}", self);
            }
            InterpretError::PromptTemplate(source) => {
                tracing::error!(status = status.as_u16(), error = %source, "{}", self);
            }
            InterpretError::Generation(source) => {
                tracing::error!(
                    status = status.as_u16(),
                    kind = source.kind(),
                    error = %source,
                    "Interpretation failed"
                );
            }
        }

        let mut response = ErrorEnvelope::new(self.to_string()).into_response_with(status);
        if matches!(self, InterpretError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn messages_match_caller_contract() {
        assert_eq!(
            InterpretError::MethodNotAllowed.to_string(),
            "Method not allowed"
        );
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            InterpretError::InvalidJson(json_err).to_string(),
            "Invalid JSON format"
        );
        let io = PromptError::Io {
            path: PathBuf::from("post-prompt.txt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(
            InterpretError::PromptTemplate(io).to_string(),
            "Failed to load prompt template"
        );
        assert_eq!(
            InterpretError::Generation(ProviderError::EmptyResponse).to_string(),
            "Failed to generate interpretation: no content in API response"
        );
    }

    #[test]
    fn statuses() {
        assert_eq!(
            InterpretError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            InterpretError::Generation(ProviderError::EmptyResponse).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn response_is_failure_envelope() {
        let response = InterpretError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": false, "error": "Method not allowed"})
        );
    }
}
