//! Shared chat-completion service with a single active model profile.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Routes calls to the configured provider (Ollama or OpenAI-compatible).
//! - No internal retry: a failed call fails the single request that made it,
//!   bounded by the configured timeout.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use llm_service::LlmService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), llm_service::error_handler::LlmError> {
//!     let svc = Arc::new(LlmService::from_env()?);
//!     let text = svc.complete("Say hello.", None).await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod services;

use crate::config::default_config::config_from_env;
use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::LlmError;
use crate::health_service::{HealthService, HealthStatus};
use crate::services::ollama_service::OllamaService;
use crate::services::open_ai_service::OpenAiService;

/// Provider-dispatched chat-completion client.
#[derive(Debug)]
enum ProviderClient {
    Ollama(OllamaService),
    OpenAi(OpenAiService),
}

/// Shared service that owns one configured chat model and a health checker.
///
/// The underlying HTTP client is created once at construction and reused
/// for every call.
#[derive(Debug)]
pub struct LlmService {
    cfg: LlmModelConfig,
    client: ProviderClient,
    health: HealthService,
}

impl LlmService {
    /// Creates a new service from an explicit config.
    ///
    /// # Errors
    /// Returns [`LlmError`] if the config is invalid for its provider or the
    /// HTTP client cannot be built.
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmError> {
        let client = match cfg.provider {
            LlmProvider::Ollama => ProviderClient::Ollama(OllamaService::new(cfg.clone())?),
            LlmProvider::OpenAi => ProviderClient::OpenAi(OpenAiService::new(cfg.clone())?),
        };
        Ok(Self {
            cfg,
            client,
            health: HealthService::new(Some(10))?,
        })
    }

    /// Creates a new service from environment variables (see
    /// [`config::default_config`]).
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(config_from_env()?)
    }

    /// Generates a single completion for `prompt`, with an optional system
    /// instruction.
    ///
    /// # Errors
    /// Returns [`LlmError`] if generation fails. There is no retry.
    pub async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError> {
        match &self.client {
            ProviderClient::Ollama(cli) => cli.generate(prompt, system).await,
            ProviderClient::OpenAi(cli) => cli.generate(prompt, system).await,
        }
    }

    /// Returns a resilient health snapshot for the configured provider.
    pub async fn health(&self) -> HealthStatus {
        self.health.check(&self.cfg).await
    }

    /// Returns the active model config.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }
}
