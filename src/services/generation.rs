//! Generation engine client.
//!
//! The quota core treats generation as an opaque call:
//! `generate(prompt) -> Result<Generation, GenerationError>`. The HTTP
//! implementation speaks the hosted text-generation inference format:
//!
//! ```json
//! {
//!   "inputs": "<s>[INST] prompt [/INST]",
//!   "parameters": { "max_new_tokens": 500, "temperature": 0.6, ... }
//! }
//! ```
//!
//! and accepts `[{"generated_text": ..}]` or `{"generated_text": ..}` back.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use crate::{config::Config, error::GenerationError, models::query::Generation};

const INSTRUCTION_END: &str = "[/INST]";

/// Something that turns a prompt into text.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError>;
}

/// Settings for [`HttpGenerationEngine`].
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// `None` leaves the engine unconfigured: every call fails.
    pub endpoint: Option<Url>,
    pub token: Option<String>,
    pub timeout: Duration,
    pub max_new_tokens: u32,
    pub temperature: f32,
}

impl From<&Config> for GenerationSettings {
    fn from(config: &Config) -> Self {
        Self {
            endpoint: config.generation_url.clone(),
            token: config.generation_token.clone(),
            timeout: Duration::from_secs(config.generation_timeout_secs),
            max_new_tokens: config.generation_max_new_tokens,
            temperature: config.generation_temperature,
        }
    }
}

/// Generation engine reached over HTTP.
pub struct HttpGenerationEngine {
    client: reqwest::Client,
    settings: GenerationSettings,
}

impl HttpGenerationEngine {
    pub fn new(settings: GenerationSettings) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GenerationError::Request(format!("HTTP client error: {e}")))?;

        Ok(Self { client, settings })
    }

    fn payload(&self, prompt: &str) -> Value {
        json!({
            "inputs": format!("<s>[INST] {prompt} {INSTRUCTION_END}"),
            "parameters": {
                "max_new_tokens": self.settings.max_new_tokens,
                "temperature": self.settings.temperature,
                "top_p": 0.9,
                "do_sample": true,
                "return_full_text": false
            }
        })
    }
}

#[async_trait]
impl GenerationEngine for HttpGenerationEngine {
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError> {
        let endpoint = self
            .settings
            .endpoint
            .as_ref()
            .ok_or(GenerationError::Unconfigured)?;

        let started = Instant::now();

        let mut request = self.client.post(endpoint.clone()).json(&self.payload(prompt));
        if let Some(token) = &self.settings.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        let body: Value =
            serde_json::from_str(&body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let text = extract_generated_text(&body)?;
        let elapsed_seconds = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;

        tracing::debug!("Generated {} chars in {}s", text.len(), elapsed_seconds);

        Ok(Generation {
            text,
            elapsed_seconds,
        })
    }
}

/// Pull the generated text out of an inference response body.
///
/// If the engine echoed the instruction, only what follows its closing
/// marker is kept.
pub fn extract_generated_text(body: &Value) -> Result<String, GenerationError> {
    let entry = match body {
        Value::Array(items) => items.first(),
        other => Some(other),
    };

    let text = entry
        .and_then(|e| e.get("generated_text"))
        .and_then(Value::as_str)
        .ok_or_else(|| GenerationError::Malformed("missing generated_text".to_string()))?;

    let text = match text.rsplit_once(INSTRUCTION_END) {
        Some((_, answer)) => answer,
        None => text,
    };

    Ok(text.trim().to_string())
}

/// The `error` field of a JSON error body, or the raw body otherwise.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
