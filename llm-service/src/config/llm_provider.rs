use crate::error_handler::{ConfigError, LlmError};

/// Represents the provider (backend) used for chat-completion inference.
///
/// Distinguishes between a local Ollama runtime and any OpenAI-compatible
/// API (including hosted routers that speak the same protocol). Adding more
/// providers in the future can be done by extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI-compatible chat-completion API.
    OpenAi,
}

impl LlmProvider {
    /// Parses a provider name as found in `LLM_KIND`.
    ///
    /// Accepted values (case-insensitive): `ollama`, `openai`, `chatgpt`.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedProvider`] for anything else.
    pub fn parse(kind: &str) -> Result<Self, LlmError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "chatgpt" => Ok(Self::OpenAi),
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}
