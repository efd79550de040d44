use crate::error::InterpretError;
use crate::models::{ChartRequest, InterpretResponse};
use crate::services::metrics;
use crate::services::providers::ProviderError;
use crate::startup::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use service_core::middleware::request_id;
use std::time::Instant;

/// `POST /interpret`: chart JSON in, model interpretation out.
#[tracing::instrument(skip_all, fields(request_id, provider))]
pub async fn interpret_chart(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let span = tracing::Span::current();
    span.record("request_id", request_id(&headers).unwrap_or("-"));
    span.record("provider", state.provider.name());

    match run_pipeline(&state, body).await {
        Ok(response) => {
            metrics::record_outcome("success");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            metrics::record_outcome(err.stage());
            err.into_response()
        }
    }
}

/// Any method other than POST on `/interpret`.
pub async fn method_not_allowed() -> Response {
    metrics::record_outcome(InterpretError::MethodNotAllowed.stage());
    InterpretError::MethodNotAllowed.into_response()
}

async fn run_pipeline(state: &AppState, body: Body) -> Result<InterpretResponse, InterpretError> {
    let bytes = axum::body::to_bytes(body, state.config.limits.max_body_bytes)
        .await
        .map_err(InterpretError::BodyRead)?;

    let request = ChartRequest::from_slice(&bytes).map_err(InterpretError::InvalidJson)?;

    let custom_prompt = request.custom_prompt();
    tracing::debug!(
        custom_prompt = custom_prompt.is_some(),
        created_at = request.created_at.as_deref().unwrap_or("-"),
        duration_of_response = request.duration_of_response,
        "Chart request decoded"
    );

    let prompt = state
        .prompts
        .resolve(custom_prompt)
        .await
        .map_err(InterpretError::PromptTemplate)?;

    let deadline = state.config.limits.request_timeout;
    let started = Instant::now();

    // Dropping the future on expiry aborts the in-flight provider request.
    let outcome = tokio::time::timeout(deadline, state.provider.generate(&prompt, &request.chart))
        .await
        .unwrap_or_else(|_| Err(ProviderError::Timeout(deadline)));

    let elapsed = started.elapsed();
    metrics::record_provider_latency(
        state.provider.name(),
        match &outcome {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        },
        elapsed.as_secs_f64(),
    );

    let generation = outcome.map_err(InterpretError::Generation)?;

    if let Some(usage) = &generation.usage {
        metrics::record_tokens(
            state.provider.name(),
            usage.prompt_tokens,
            usage.completion_tokens,
        );
    }

    tracing::info!(
        elapsed_ms = elapsed.as_millis() as u64,
        interpretation_len = generation.text.len(),
        prompt_tokens = generation.usage.map(|u| u.prompt_tokens),
        completion_tokens = generation.usage.map(|u| u.completion_tokens),
        "Interpretation generated"
    );

    Ok(InterpretResponse::new(
        generation.text,
        generation.usage,
        elapsed,
    ))
}
