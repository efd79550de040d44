use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_PROMPT_PATH: &str = "post-prompt.txt";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct InterpretConfig {
    pub common: core_config::Config,
    pub provider: ProviderConfig,
    pub prompt: PromptConfig,
    pub limits: LimitsConfig,
    pub otlp_endpoint: Option<String>,
}

/// Which `TextProvider` implementation serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Mock,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Absent or empty keys are reported per request, not at startup.
    pub api_key: Option<Secret<String>>,
    pub api_base: String,
    pub text_model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub template_path: PathBuf,
    pub cache_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Hard deadline for the provider call of one request.
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl InterpretConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let request_timeout = Duration::from_secs(parse_env(
            "INTERPRET_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));
        let provider_timeout = Duration::from_secs(parse_env(
            "GENAI_PROVIDER_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));

        Ok(InterpretConfig {
            common: common_config,
            provider: ProviderConfig {
                kind: parse_provider_kind(&get_env("GENAI_PROVIDER", "gemini")),
                api_key: env::var("GOOGLE_AI_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .map(Secret::new),
                api_base: get_env("GENAI_API_BASE", DEFAULT_API_BASE),
                text_model: get_env("GENAI_TEXT_MODEL", DEFAULT_TEXT_MODEL),
                timeout: clamp_provider_timeout(provider_timeout, request_timeout),
            },
            prompt: PromptConfig {
                template_path: PathBuf::from(get_env("PROMPT_TEMPLATE_PATH", DEFAULT_PROMPT_PATH)),
                cache_enabled: parse_env("PROMPT_CACHE_ENABLED", false),
            },
            limits: LimitsConfig {
                request_timeout,
                max_body_bytes: parse_env("INTERPRET_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
        })
    }

    /// Defaults without consulting the environment.
    pub fn with_defaults() -> Self {
        let request_timeout = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);
        InterpretConfig {
            common: core_config::Config::default(),
            provider: ProviderConfig {
                kind: ProviderKind::Gemini,
                api_key: None,
                api_base: DEFAULT_API_BASE.to_string(),
                text_model: DEFAULT_TEXT_MODEL.to_string(),
                timeout: request_timeout,
            },
            prompt: PromptConfig {
                template_path: PathBuf::from(DEFAULT_PROMPT_PATH),
                cache_enabled: false,
            },
            limits: LimitsConfig {
                request_timeout,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            otlp_endpoint: None,
        }
    }
}

/// The outbound client deadline never outlives the request deadline.
pub fn clamp_provider_timeout(provider: Duration, request: Duration) -> Duration {
    provider.min(request)
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unknown values fall back to the real provider.
fn parse_provider_kind(value: &str) -> ProviderKind {
    match value.trim().to_ascii_lowercase().as_str() {
        "mock" => ProviderKind::Mock,
        _ => ProviderKind::Gemini,
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_timeout_is_clamped_to_request_timeout() {
        let request = Duration::from_secs(30);
        assert_eq!(
            clamp_provider_timeout(Duration::from_secs(120), request),
            request
        );
        assert_eq!(
            clamp_provider_timeout(Duration::from_secs(10), request),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn provider_kind_parsing() {
        assert_eq!(parse_provider_kind("mock"), ProviderKind::Mock);
        assert_eq!(parse_provider_kind(" MOCK "), ProviderKind::Mock);
        assert_eq!(parse_provider_kind("gemini"), ProviderKind::Gemini);
        assert_eq!(parse_provider_kind("something-else"), ProviderKind::Gemini);
    }

    #[test]
    fn unset_variables_use_defaults() {
        assert_eq!(
            get_env("INTERPRET_TEST_UNSET_VARIABLE_8f3a", "fallback"),
            "fallback"
        );
        assert_eq!(parse_env("INTERPRET_TEST_UNSET_VARIABLE_8f3a", 42u64), 42);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = InterpretConfig::with_defaults();
        assert_eq!(config.common.port, 9494);
        assert_eq!(config.limits.request_timeout, Duration::from_secs(30));
        assert_eq!(config.prompt.template_path, PathBuf::from("post-prompt.txt"));
        assert!(config.provider.api_key.is_none());
        assert!(!config.prompt.cache_enabled);
    }
}
