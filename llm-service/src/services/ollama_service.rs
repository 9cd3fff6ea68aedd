//! Lightweight Ollama service for chat-style text generation.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate` — synchronous text generation (`stream=false`)
//!
//! It uses the universal configuration [`LlmModelConfig`] and ensures
//! that the selected provider is [`LlmProvider::Ollama`].

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, LlmError, make_snippet, validate_http_endpoint};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout and exposes a single high-level call:
/// - [`OllamaService::generate`] — synchronous text generation
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::UnsupportedProvider`] if `cfg.provider` is not `Ollama`
    /// - [`ConfigError::InvalidFormat`] if `cfg.endpoint` is invalid
    /// - [`LlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(ConfigError::UnsupportedProvider(format!("{:?}", cfg.provider)).into());
        }
        validate_http_endpoint("OLLAMA_URL", &cfg.endpoint)?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/').to_string();
        let url_generate = format!("{}/api/generate", base);

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OllamaService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
        })
    }

    /// Performs a **non-streaming** generation request via `/api/generate`.
    ///
    /// Mapped options:
    /// - `model`        ← `self.cfg.model`
    /// - `prompt`       ← argument
    /// - `system`       ← optional system instruction
    /// - `num_predict`  ← `self.cfg.max_tokens`
    /// - `temperature`  ← `self.cfg.temperature`
    /// - `top_p`        ← `self.cfg.top_p`
    ///
    /// # Errors
    /// - [`LlmError::HttpStatus`] for non-2xx responses
    /// - [`LlmError::HttpTransport`] for client errors
    /// - [`LlmError::Decode`] if the response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError> {
        let started = Instant::now();
        let body = GenerateRequest::from_cfg(&self.cfg, prompt, system);

        debug!(prompt_len = prompt.len(), "POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_generate.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Ollama /api/generate returned non-success status"
            );

            return Err(LlmError::HttpStatus {
                status,
                url,
                snippet,
            });
        }

        let out: GenerateResponse = resp.json().await.map_err(|e| {
            LlmError::Decode(format!("serde error: {e}; ensure `stream=false` is used"))
        })?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            "generation completed"
        );

        Ok(out.response)
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate` (non-streaming).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

impl<'a> GenerateRequest<'a> {
    /// Builds a request from config, prompt and an optional system instruction.
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let options = GenerateOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model: &cfg.model,
            prompt,
            system,
            stream: false,
            options: Some(options),
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response body for `/api/generate`.
///
/// Minimal shape: the generated text is in `response`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
