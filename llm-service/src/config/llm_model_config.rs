use crate::config::llm_provider::LlmProvider;

/// Configuration for a chat-completion model invocation.
///
/// This struct contains both general and provider-specific parameters.
/// It can be extended as needed to support new backends or features.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend (e.g., Ollama, OpenAI).
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"gpt-4o-mini"`, `"llama3"`).
    pub model: String,

    /// Inference endpoint (local server or remote API URL).
    pub endpoint: String,

    /// Optional API key for authentication (OpenAI-compatible providers).
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (controls creativity).
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout in seconds. The upstream call is never retried, so
    /// this bounds the worst-case latency of a single turn.
    pub timeout_secs: Option<u64>,
}
