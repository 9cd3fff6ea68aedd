use llm_service::error_handler::LlmError;
use path_store::StoreError;
use thiserror::Error;

/// Errors produced while handling one tutoring turn.
///
/// Both variants wrap their source so callers can map them to distinct HTTP
/// statuses while logs keep the full cause chain.
#[derive(Debug, Error)]
pub enum TutorError {
    /// The learning-path content could not be loaded.
    #[error("[Tutoring] unable to load learning path content: {0}")]
    ContentLoad(#[source] StoreError),

    /// The upstream model call failed.
    #[error("[Tutoring] upstream model call failed: {0}")]
    UpstreamModel(#[source] LlmError),
}

impl TutorError {
    /// Whether the failure is a missing learning path rather than an outage.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ContentLoad(StoreError::NotFound))
    }
}
