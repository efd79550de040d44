//! Application startup and lifecycle management.
//!
//! Builds the router, wires the configured provider and prompt loader into
//! shared state, and binds the HTTP listener.

use crate::config::{InterpretConfig, ProviderKind};
use crate::handlers::{
    health::{health_check, readiness_check},
    interpret::{interpret_chart, method_not_allowed},
    metrics::metrics,
};
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::mock::MockTextProvider;
use crate::services::providers::TextProvider;
use crate::services::PromptLoader;
use axum::{
    http::Uri,
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<InterpretConfig>,
    pub prompts: Arc<PromptLoader>,
    pub provider: Arc<dyn TextProvider>,
}

impl AppState {
    pub fn new(
        config: InterpretConfig,
        prompts: PromptLoader,
        provider: Arc<dyn TextProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            prompts: Arc::new(prompts),
            provider,
        }
    }

    /// Wire the provider and prompt loader selected by `config`.
    pub fn from_config(config: InterpretConfig) -> Result<Self, AppError> {
        let provider: Arc<dyn TextProvider> = match config.provider.kind {
            ProviderKind::Gemini => {
                let gemini = GeminiTextProvider::new(GeminiConfig {
                    api_key: config.provider.api_key.clone(),
                    api_base: config.provider.api_base.clone(),
                    model: config.provider.text_model.clone(),
                    timeout: config.provider.timeout,
                })
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

                if config.provider.api_key.is_none() {
                    tracing::warn!("GOOGLE_AI_API_KEY is not set; interpretation requests will fail");
                }
                Arc::new(gemini)
            }
            ProviderKind::Mock => Arc::new(MockTextProvider::new(true)),
        };

        tracing::info!(
            provider = provider.name(),
            model = %config.provider.text_model,
            "Initialized text provider"
        );

        let prompts = PromptLoader::new(config.prompt.template_path.clone())
            .with_cache(config.prompt.cache_enabled);
        tracing::info!(
            path = %prompts.path().display(),
            cache = config.prompt.cache_enabled,
            "Initialized prompt loader"
        );

        Ok(Self::new(config, prompts, provider))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/interpret",
            post(interpret_chart).fallback(method_not_allowed),
        )
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(anyhow::anyhow!("No route for {}", uri.path()))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::InternalError(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: InterpretConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(config)?;
        Self::build_with_state(state).await
    }

    /// Build around pre-wired state (port 0 = random port for testing).
    pub async fn build_with_state(state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Interpret service listening on port {}", port);
        tracing::info!("Endpoint: POST /interpret");

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until the process is stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Run until `signal` resolves, letting in-flight requests finish.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}
