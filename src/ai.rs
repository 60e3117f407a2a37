use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::PipelineError;

// --- Provider trait ---

/// A text-understanding service that answers in JSON conforming to a response schema.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Sends one prompt and returns the raw JSON text of the answer. No retries.
    async fn complete_json(&self, prompt: &str, schema: &Value) -> Result<String, PipelineError>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub model_id: String,
    pub short_name: String,
}

pub const DEFAULT_MODEL: &str = "gemini-flash";

pub const AVAILABLE_MODELS: [&str; 4] = [
    "gemini-flash",
    "gemini-flash-lite",
    "gemini-2.5-flash",
    "gemini-pro",
];

pub fn resolve_model(name: &str) -> Result<ModelSpec, PipelineError> {
    let (model_id, short_name) = match name {
        "gemini-flash" | "flash" => ("gemini-2.0-flash", "gemini-flash"),
        "gemini-flash-lite" | "flash-lite" => ("gemini-2.0-flash-lite", "gemini-flash-lite"),
        "gemini-2.5-flash" => ("gemini-2.5-flash", "gemini-2.5-flash"),
        "gemini-pro" | "pro" => ("gemini-2.5-pro", "gemini-pro"),
        _ => {
            return Err(PipelineError::Configuration(format!(
                "Unknown model '{}'. Available: {}",
                name,
                AVAILABLE_MODELS.join(", ")
            )));
        }
    };
    Ok(ModelSpec {
        model_id: model_id.to_string(),
        short_name: short_name.to_string(),
    })
}

/// Builds the provider described by `config`. `Ok(None)` means no credential was configured.
pub fn create_provider(config: &Config) -> Result<Option<Arc<dyn AIProvider>>, PipelineError> {
    let Some(api_key) = config.api_key.clone() else {
        return Ok(None);
    };
    let mut provider = GeminiProvider::new(api_key, config.model.model_id.clone(), config.timeout)?;
    if let Some(url) = &config.api_base_url {
        provider = provider.with_base_url(url.clone());
    }
    Ok(Some(Arc::new(provider)))
}

// --- Gemini provider ---

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug)]
pub struct GeminiProvider {
    api_key: String,
    model_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, model_id: String, timeout: Duration) -> Result<Self, PipelineError> {
        if api_key.trim().is_empty() {
            return Err(PipelineError::Configuration("API key is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::external_with("Failed to create HTTP client", e))?;
        Ok(Self {
            api_key,
            model_id,
            base_url: GEMINI_API_URL.to_string(),
            client,
        })
    }

    /// Points the provider at another endpoint (proxies, mock servers).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model_id
        )
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn complete_json(&self, prompt: &str, schema: &Value) -> Result<String, PipelineError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        debug!(model = %self.model_id, "sending request to Gemini API");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::external_with("Failed to send request to Gemini API", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, body = %error_text, "Gemini API request failed");
            return Err(PipelineError::external(format!(
                "Gemini API request failed with status {}: {}",
                status, error_text
            )));
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::external_with("Failed to parse Gemini API response", e))?;

        let text: String = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(PipelineError::external("No content in Gemini API response"));
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}
