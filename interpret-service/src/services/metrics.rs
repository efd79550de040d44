//! Prometheus metrics for interpret-service.
//!
//! HTTP request metrics come from the `metrics` recorder installed here and fed
//! by the shared middleware; interpretation-specific series live in a separate
//! `prometheus` registry. Both are rendered together on `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static INTERPRETATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static INTERPRETATION_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize all metrics. Must be called once at startup.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }

    let registry = Registry::new();

    // outcome: success, or the failing stage
    let interpretations = IntCounterVec::new(
        Opts::new(
            "interpretations_total",
            "Interpretation requests by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create interpretations_total metric");

    let tokens = IntCounterVec::new(
        Opts::new(
            "interpretation_tokens_total",
            "Provider-reported tokens consumed",
        ),
        &["provider", "type"], // type: prompt, completion
    )
    .expect("Failed to create interpretation_tokens_total metric");

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "provider_latency_seconds",
            "Latency of generation provider calls in seconds",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0]),
        &["provider", "status"],
    )
    .expect("Failed to create provider_latency_seconds metric");

    registry
        .register(Box::new(interpretations.clone()))
        .expect("Failed to register interpretations_total");
    registry
        .register(Box::new(tokens.clone()))
        .expect("Failed to register interpretation_tokens_total");
    registry
        .register(Box::new(provider_latency.clone()))
        .expect("Failed to register provider_latency_seconds");

    let _ = PROMETHEUS_REGISTRY.set(registry);
    let _ = INTERPRETATIONS_TOTAL.set(interpretations);
    let _ = INTERPRETATION_TOKENS_TOTAL.set(tokens);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        let mut buffer = Vec::new();
        if TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .is_ok()
        {
            output.push_str(&String::from_utf8_lossy(&buffer));
        }
    }

    output
}

pub fn record_outcome(outcome: &str) {
    if let Some(counter) = INTERPRETATIONS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_tokens(provider: &str, prompt_tokens: u32, completion_tokens: u32) {
    if let Some(counter) = INTERPRETATION_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[provider, "prompt"])
            .inc_by(u64::from(prompt_tokens));
        counter
            .with_label_values(&[provider, "completion"])
            .inc_by(u64::from(completion_tokens));
    }
}

pub fn record_provider_latency(provider: &str, status: &str, seconds: f64) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, status])
            .observe(seconds);
    }
}
