//! Unified error handling for `llm-service`.
//!
//! This module exposes a single top-level error type [`LlmError`] for the whole
//! library and groups configuration errors in a nested enum ([`ConfigError`]).
//! Small helpers for reading/validating environment variables are provided and
//! return the unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[LLM Service]` to simplify attribution in logs.

use reqwest::StatusCode;
use thiserror::Error;

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Top-level error for the `llm-service` crate.
///
/// Variants wrap the config sub-enum and a few common transport/protocol
/// cases. Prefer adding new sub-enums for distinct domains instead of
/// growing this type indefinitely.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Upstream returned a non-successful HTTP status.
    #[error("[LLM Service] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body (trimmed).
        snippet: String,
    },

    /// Response payload could not be decoded as expected.
    #[error("[LLM Service] decode error: {0}")]
    Decode(String),

    /// Chat completion response carried no usable choices.
    #[error("[LLM Service] empty choices in completion response")]
    EmptyChoices,
}

/// Error enum for environment/config-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`, `OLLAMA_PORT`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND`.
    #[error("[LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `OLLAMA_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// API key is required by the provider but was not supplied.
    #[error("[LLM Service] missing API key for provider")]
    MissingApiKey,
}

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`LlmError::Config`] with [`ConfigError::MissingVar`] if the
/// variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`LlmError::Config`] with [`ConfigError::InvalidNumber`] if the
/// variable is set but not a valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.parse::<u32>().map(Some).map_err(|_| {
            LlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`LlmError::Config`] with [`ConfigError::InvalidNumber`] if the
/// variable is set but not a valid `u64`.
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.parse::<u64>().map(Some).map_err(|_| {
            LlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        _ => Ok(None),
    }
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`LlmError::Config`] with [`ConfigError::InvalidFormat`] when
/// the string does not start with a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    let value = value.trim();
    if !value.is_empty() && (value.starts_with("http://") || value.starts_with("https://")) {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Trims a response body to a short, log-friendly snippet.
pub fn make_snippet(text: &str) -> String {
    text.chars().take(240).collect()
}
