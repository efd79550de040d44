#![allow(dead_code)]

use interpret_service::config::InterpretConfig;
use interpret_service::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_TEMPLATE: &str = "You are a Vedic astrologer.\nInterpret the chart below.\n";
pub const GEMINI_PATH: &str = "/models/gemini-1.5-flash:generateContent";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub gemini: MockServer,
    pub prompt_path: PathBuf,
    pub client: reqwest::Client,
    // Keeps the template directory alive for the duration of the test.
    _prompt_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn against a fake Gemini API, letting the test adjust config first.
    pub async fn spawn_with(customize: impl FnOnce(&mut InterpretConfig)) -> Self {
        let gemini = MockServer::start().await;

        let prompt_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let prompt_path = prompt_dir.path().join("post-prompt.txt");
        std::fs::write(&prompt_path, TEST_TEMPLATE).expect("Failed to write prompt template");

        let mut config = InterpretConfig::with_defaults();
        config.common.port = 0; // Random port for testing
        config.provider.api_key = Some(Secret::new(TEST_API_KEY.to_string()));
        config.provider.api_base = gemini.uri();
        config.prompt.template_path = prompt_path.clone();
        customize(&mut config);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            gemini,
            prompt_path,
            client,
            _prompt_dir: prompt_dir,
        }
    }

    pub async fn post_interpret(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/interpret", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn post_raw(&self, body: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/interpret", self.address))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Requests the fake Gemini API has seen so far.
    pub async fn gemini_requests(&self) -> Vec<wiremock::Request> {
        self.gemini.received_requests().await.unwrap_or_default()
    }

    /// Full prompt text carried by the n-th Gemini request.
    pub async fn sent_prompt(&self, index: usize) -> String {
        let requests = self.gemini_requests().await;
        let body: Value =
            serde_json::from_slice(&requests[index].body).expect("Gemini request was not JSON");
        body["contents"][0]["parts"][0]["text"]
            .as_str()
            .expect("Gemini request had no text part")
            .to_string()
    }
}

pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 120,
            "candidatesTokenCount": 45,
            "totalTokenCount": 165
        }
    })
}

pub async fn mount_gemini(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(header("x-goog-api-key", TEST_API_KEY))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_gemini_text(server: &MockServer, text: &str) {
    mount_gemini(server, ResponseTemplate::new(200).set_body_json(gemini_reply(text))).await;
}

pub fn sample_chart() -> Value {
    json!({
        "ascendant": {"sign": "Virgo", "degree": 14.2},
        "planets": [
            {"name": "Sun", "sign": "Leo", "house": 12},
            {"name": "Moon", "sign": "Cancer", "house": 11, "nakshatra": "Pushya"}
        ],
        "dasha": null
    })
}

pub fn chart_request(chart: Value) -> Value {
    json!({
        "chart": chart,
        "duration_of_response": 2.5,
        "created_at": "2024-05-01T10:00:00Z"
    })
}

/// `"1.23s"` style: non-negative, two decimals, trailing `s`.
pub fn assert_processing_time_format(value: &str) {
    let seconds = value
        .strip_suffix('s')
        .unwrap_or_else(|| panic!("processing_time {:?} lacks the 's' suffix", value));
    let (_, decimals) = seconds
        .split_once('.')
        .unwrap_or_else(|| panic!("processing_time {:?} has no decimals", value));
    assert_eq!(decimals.len(), 2, "processing_time {:?}", value);
    assert!(seconds.parse::<f64>().unwrap() >= 0.0);
}
