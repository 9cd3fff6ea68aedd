//! Default LLM config loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`         = provider kind (`ollama` (default) or `openai`)
//! - `LLM_MAX_TOKENS`   = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u64, default 60)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = model name (mandatory)
//!
//! OpenAI-specific:
//! - `OPENAI_URL`     = endpoint base (default `https://api.openai.com`)
//! - `OPENAI_MODEL`   = model name (mandatory)
//! - `OPENAI_API_KEY` = API key (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{ConfigError, LlmError, env_opt_u32, env_opt_u64, must_env},
};

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, LlmError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            let _ = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{port}"));
        }
    }
    Err(LlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

/// Constructs the chat model config from environment, routed by `LLM_KIND`.
///
/// # Errors
/// Propagates [`ConfigError`] for missing/invalid variables.
pub fn config_from_env() -> Result<LlmModelConfig, LlmError> {
    let kind = std::env::var("LLM_KIND").unwrap_or_else(|_| "ollama".into());
    let provider = LlmProvider::parse(&kind)?;
    match provider {
        LlmProvider::Ollama => config_ollama(),
        LlmProvider::OpenAi => config_openai(),
    }
}

/// Constructs a config for the Ollama chat model.
///
/// # Defaults
/// - `temperature = Some(0.7)`
/// - `timeout_secs = Some(60)` unless `LLM_TIMEOUT_SECS` overrides it
pub fn config_ollama() -> Result<LlmModelConfig, LlmError> {
    let endpoint = ollama_endpoint()?;
    let model = must_env("OLLAMA_MODEL")?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.or(Some(60));

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens,
        temperature: Some(0.7),
        top_p: None,
        timeout_secs,
    })
}

/// Constructs a config for an OpenAI-compatible chat model.
///
/// # Defaults
/// - `endpoint = https://api.openai.com` unless `OPENAI_URL` overrides it
/// - `temperature = Some(0.7)`
/// - `timeout_secs = Some(60)` unless `LLM_TIMEOUT_SECS` overrides it
pub fn config_openai() -> Result<LlmModelConfig, LlmError> {
    let endpoint =
        std::env::var("OPENAI_URL").unwrap_or_else(|_| "https://api.openai.com".into());
    let model = must_env("OPENAI_MODEL")?;
    let api_key = must_env("OPENAI_API_KEY")?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.or(Some(60));

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAi,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens,
        temperature: Some(0.7),
        top_p: None,
        timeout_secs,
    })
}
