//! OpenAI-compatible service for chat-style text generation.
//!
//! Minimal, non-streaming client around the chat-completion REST API.
//! The endpoint is derived from `LlmModelConfig::endpoint`:
//! - `POST {endpoint}/v1/chat/completions` — chat completion (non-streaming)
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAi`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, LlmError, make_snippet, validate_http_endpoint};

/// Thin client for an OpenAI-compatible API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers) and
/// exposes a single high-level call:
/// - [`OpenAiService::generate`] — single, non-streaming chat completion
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// Validates the provider, API key, and endpoint scheme. Builds an HTTP
    /// client with default headers and a configurable timeout.
    ///
    /// # Errors
    /// - [`ConfigError::UnsupportedProvider`] if `cfg.provider` is not OpenAI
    /// - [`ConfigError::MissingApiKey`] if `cfg.api_key` is `None`
    /// - [`ConfigError::InvalidFormat`] if `cfg.endpoint` is invalid
    /// - [`LlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmError> {
        if cfg.provider != LlmProvider::OpenAi {
            return Err(ConfigError::UnsupportedProvider(format!("{:?}", cfg.provider)).into());
        }

        let api_key = cfg.api_key.clone().ok_or(ConfigError::MissingApiKey)?;

        validate_http_endpoint("OPENAI_URL", &cfg.endpoint)?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| LlmError::Decode(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/').to_string();
        let url_chat = format!("{}/v1/chat/completions", base);

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a **non-streaming** chat completion request (`/v1/chat/completions`).
    ///
    /// Minimal `messages` array:
    /// - optional system message (if provided)
    /// - user message with `prompt`.
    ///
    /// Mapped options from config: `model`, `temperature`, `top_p`, `max_tokens`.
    ///
    /// # Errors
    /// - [`LlmError::HttpStatus`] for non-2xx responses
    /// - [`LlmError::HttpTransport`] for client/network failures
    /// - [`LlmError::Decode`] if the JSON cannot be parsed
    /// - [`LlmError::EmptyChoices`] if no choices are returned
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system);

        debug!(
            prompt_len = prompt.len(),
            has_system = system.is_some(),
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "OpenAI /v1/chat/completions returned non-success status"
            );

            return Err(LlmError::HttpStatus {
                status,
                url,
                snippet,
            });
        }

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            LlmError::Decode(format!(
                "serde error: {e}; expected `choices[0].message.content`"
            ))
        })?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or(LlmError::EmptyChoices)?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(content)
    }
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Minimal request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    /// Builds a minimal chat request from config, `prompt`, and an optional system message.
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(ChatMessage {
                role: "system",
                content: Some(sys),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: Some(prompt),
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

/// Chat message for the OpenAI API.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    /// One of: "system" | "user" | "assistant".
    role: &'a str,
    /// Plain string content.
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

/// Minimal response for `/v1/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}
