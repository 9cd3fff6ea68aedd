use std::sync::Arc;
use std::time::Duration;

use llm_service::LlmService;
use path_store::LearningPathStore;
use reply_cache::ReplyCache;
use tracing::info;
use tutoring::{ModelClient, TutorService};

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Turn pipeline used by the chat endpoint.
    pub tutor: TutorService,
    /// Learning-path store, used directly by the listing endpoints.
    pub store: LearningPathStore,
    /// Configured model service, kept around for the health endpoint.
    pub llm: Arc<LlmService>,
}

impl AppState {
    /// Loads shared state from environment variables.
    ///
    /// `DATABASE_URL` defaults to `sqlite://tutor.db`, `CACHE_CAPACITY` to
    /// 10000 entries; `CACHE_TTL_SECS` is optional (no TTL when unset).
    pub async fn from_env() -> Result<Self, AppError> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://tutor.db".into());
        let capacity = std::env::var("CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000);
        let ttl = std::env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs);

        let store = LearningPathStore::connect(&database_url)
            .await
            .map_err(AppError::StoreInit)?;
        store.migrate().await.map_err(AppError::StoreInit)?;

        let llm = Arc::new(LlmService::from_env().map_err(AppError::LlmConfig)?);
        info!(model = %llm.config().model, "model service configured");

        let cache = ReplyCache::new(capacity, ttl);
        let tutor = TutorService::new(store.clone(), cache, llm.clone() as Arc<dyn ModelClient>);

        Ok(Self { tutor, store, llm })
    }
}
