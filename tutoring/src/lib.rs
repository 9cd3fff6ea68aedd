//! Tutoring turn core.
//!
//! One conversational turn flows through this crate: classify the turn,
//! resolve learning-path content (cache-aside over the store), build the
//! prompt, call the model (cache-aside over the reply cache), normalize the
//! raw output, and append the exchange to the caller's session.
//!
//! The HTTP layer stays thin; everything testable lives here, behind the
//! [`ModelClient`] seam so tests never touch a real model.

pub mod error;
pub mod normalize;
pub mod prompt;
pub mod session;
pub mod turn;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use llm_service::LlmService;
use llm_service::error_handler::LlmError;
use path_store::LearningPathStore;
use reply_cache::{ReplyCache, learning_path_key, model_reply_key};

pub use crate::error::TutorError;
use crate::normalize::ParsedModelReply;
use crate::session::ConversationSession;
use crate::turn::TurnKind;

/// Maximum number of learning-path characters fed into the prompt.
pub const CONTENT_SUMMARY_CHARS: usize = 1000;

/// Seam over the chat-completion backend, so the turn pipeline can be tested
/// against a stub.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError>;
}

#[async_trait]
impl ModelClient for LlmService {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError> {
        LlmService::complete(self, prompt, system).await
    }
}

/// One incoming chat turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Raw user input; trimmed before classification.
    pub message: String,
    /// Title of the learning path being studied.
    pub learning_path: String,
    /// Conversation state as last returned to the caller.
    pub session: ConversationSession,
    /// True on the first turn of a conversation.
    pub is_first_response: bool,
    /// False switches the turn to hint-only mode without scoring.
    pub scored: bool,
}

/// The outcome of one handled turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: ParsedModelReply,
    pub session: ConversationSession,
}

/// Orchestrates one tutoring turn end to end.
///
/// Cheap to clone; the store, cache and model handle are all shared.
#[derive(Clone)]
pub struct TutorService {
    store: LearningPathStore,
    cache: ReplyCache,
    model: Arc<dyn ModelClient>,
}

impl TutorService {
    pub fn new(store: LearningPathStore, cache: ReplyCache, model: Arc<dyn ModelClient>) -> Self {
        Self {
            store,
            cache,
            model,
        }
    }

    /// Handles one chat turn.
    ///
    /// # Errors
    /// [`TutorError::ContentLoad`] when the learning path cannot be resolved,
    /// [`TutorError::UpstreamModel`] when the model call fails. Malformed
    /// model output is not an error; the normalizer absorbs it.
    #[instrument(skip(self, request), fields(learning_path = %request.learning_path))]
    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnOutcome, TutorError> {
        let user_input = request.message.trim();
        let kind = TurnKind::classify(user_input, request.is_first_response, request.scored);
        debug!(?kind, "classified turn");

        let content = self.load_content(&request.learning_path).await?;
        let summary = content_summary(&content, CONTENT_SUMMARY_CHARS);

        let prompt = prompt::build_prompt(
            &request.learning_path,
            summary,
            kind,
            &request.session.conversation,
            &request.session.last_question,
            user_input,
        );

        let reply = self
            .resolve_reply(&request.learning_path, user_input, &request.session, &prompt, summary, kind)
            .await?;

        let session = session::apply(request.session, user_input, &reply, kind);
        Ok(TurnOutcome { reply, session })
    }

    /// Loads learning-path content cache-aside: cache hit, else store lookup
    /// followed by a cache fill.
    async fn load_content(&self, learning_path: &str) -> Result<String, TutorError> {
        let key = learning_path_key(learning_path);
        if let Some(content) = self.cache.get(&key).await {
            return Ok(content);
        }

        let path = self
            .store
            .find_by_title(learning_path)
            .await
            .map_err(TutorError::ContentLoad)?;
        self.cache.insert(key, path.description.clone()).await;
        Ok(path.description)
    }

    /// Resolves the normalized model reply, cache-aside over the reply cache.
    ///
    /// A cached entry that fails to decode is treated as a miss and
    /// overwritten by the fresh result.
    async fn resolve_reply(
        &self,
        learning_path: &str,
        user_input: &str,
        session: &ConversationSession,
        prompt: &str,
        summary: &str,
        kind: TurnKind,
    ) -> Result<ParsedModelReply, TutorError> {
        let key = model_reply_key(learning_path, user_input, &session.conversation_text());

        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_str::<ParsedModelReply>(&cached) {
                Ok(reply) => {
                    info!("serving model reply from cache");
                    // The key does not cover the turn kind, so the cached
                    // entry may stem from a differently-scored request.
                    return Ok(reply.conform_to(kind));
                }
                Err(err) => {
                    warn!(%err, "discarding undecodable cache entry");
                }
            }
        }

        let raw = self
            .model
            .complete(prompt, Some(summary))
            .await
            .map_err(TutorError::UpstreamModel)?;
        let reply = normalize::normalize(&raw, kind);

        if let Ok(encoded) = serde_json::to_string(&reply) {
            self.cache.insert(key, encoded).await;
        }
        Ok(reply)
    }
}

/// Returns the leading `max_chars` characters of `content`, cut on a char
/// boundary.
pub fn content_summary(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubModel {
        response: String,
        calls: AtomicUsize,
    }

    impl StubModel {
        fn new(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelClient for StubModel {
        async fn complete(&self, _prompt: &str, _system: Option<&str>) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    async fn service_with(model: Arc<StubModel>) -> TutorService {
        let store = LearningPathStore::connect("sqlite::memory:").await.unwrap();
        store.migrate().await.unwrap();
        store
            .upsert("Whatsapp", "Design a messaging system at scale.")
            .await
            .unwrap();
        TutorService::new(store, ReplyCache::new(64, None), model)
    }

    fn request(message: &str, first: bool, session: ConversationSession) -> TurnRequest {
        TurnRequest {
            message: message.to_string(),
            learning_path: "Whatsapp".to_string(),
            session,
            is_first_response: first,
            scored: true,
        }
    }

    #[tokio::test]
    async fn first_turn_appends_two_entries() {
        let model =
            StubModel::new(r#"{"reply": "Welcome! What is a message broker?", "hint": ""}"#);
        let svc = service_with(model).await;

        let outcome = svc
            .run_turn(request("hi", true, ConversationSession::default()))
            .await
            .unwrap();

        assert_eq!(outcome.reply.reply, "Welcome! What is a message broker?");
        assert_eq!(outcome.reply.score, None);
        assert_eq!(outcome.session.conversation.len(), 2);
        assert_eq!(
            outcome.session.last_question,
            "Welcome! What is a message broker?"
        );
    }

    #[tokio::test]
    async fn generic_ack_scores_zero() {
        let model = StubModel::new(
            r#"{"reply": "Let me rephrase: how are messages stored?", "hint": "", "code": "", "score": 8, "feedback": "great"}"#,
        );
        let svc = service_with(model).await;

        let mut session = ConversationSession::default();
        session.last_question = "How are messages stored?".to_string();
        let outcome = svc.run_turn(request("ok", false, session)).await.unwrap();

        assert_eq!(outcome.reply.score, Some(0));
        assert_eq!(
            outcome.reply.feedback.as_deref(),
            Some(normalize::GENERIC_ACK_FEEDBACK)
        );
    }

    #[tokio::test]
    async fn identical_turn_hits_reply_cache() {
        let model = StubModel::new(r#"{"reply": "Good. Next question?", "score": 7}"#);
        let svc = service_with(model.clone()).await;

        let first = svc
            .run_turn(request("use kafka", false, ConversationSession::default()))
            .await
            .unwrap();
        let second = svc
            .run_turn(request("use kafka", false, ConversationSession::default()))
            .await
            .unwrap();

        assert_eq!(first.reply, second.reply);
        assert_eq!(model.call_count(), 1, "second turn must be a cache hit");
    }

    #[tokio::test]
    async fn cached_reply_conforms_to_turn_kind() {
        let model = StubModel::new(r#"{"reply": "Good. Next question?", "score": 7}"#);
        let svc = service_with(model.clone()).await;

        let scored = svc
            .run_turn(request("use kafka", false, ConversationSession::default()))
            .await
            .unwrap();
        assert_eq!(scored.reply.score, Some(7));

        let mut unscored = request("use kafka", false, ConversationSession::default());
        unscored.scored = false;
        let outcome = svc.run_turn(unscored).await.unwrap();

        assert_eq!(model.call_count(), 1, "second turn must be a cache hit");
        assert_eq!(outcome.reply.score, None);
        assert_eq!(outcome.reply.feedback, None);
    }

    #[tokio::test]
    async fn unknown_learning_path_is_content_load_error() {
        let model = StubModel::new("{}");
        let svc = service_with(model.clone()).await;

        let mut req = request("hi", true, ConversationSession::default());
        req.learning_path = "No Such Path".to_string();
        let err = svc.run_turn(req).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(model.call_count(), 0, "model must not be called");
    }

    #[tokio::test]
    async fn input_is_trimmed_before_classification() {
        let model = StubModel::new(r#"{"reply": "rephrasing", "score": 4}"#);
        let svc = service_with(model).await;

        let mut session = ConversationSession::default();
        session.last_question = "Q?".to_string();
        let outcome = svc.run_turn(request("  OK  ", false, session)).await.unwrap();

        // trimmed "OK" counts as a generic ack
        assert_eq!(outcome.reply.score, Some(0));
    }

    #[test]
    fn summary_respects_char_boundaries() {
        let s = "é".repeat(1200);
        let cut = content_summary(&s, CONTENT_SUMMARY_CHARS);
        assert_eq!(cut.chars().count(), CONTENT_SUMMARY_CHARS);
        assert!(content_summary("short", 1000).len() == 5);
    }
}
