use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /interpret`.
///
/// `chart` is passed through untouched; the remaining fields are informational
/// except `custom_prompt`, which replaces the template file for one request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartRequest {
    #[serde(default)]
    pub chart: Value,

    #[serde(default)]
    pub duration_of_response: Option<f64>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub custom_prompt: Option<String>,
}

impl ChartRequest {
    /// Decode a request body. A bare `null` is an empty request.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<Option<Self>>(bytes).map(Option::unwrap_or_default)
    }

    /// The inline prompt override, if one was sent with any content.
    pub fn custom_prompt(&self) -> Option<&str> {
        self.custom_prompt.as_deref().filter(|p| !p.is_empty())
    }
}
