use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use path_store::StoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use tutoring::TutorError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("invalid llm configuration")]
    LlmConfig(#[source] llm_service::error_handler::LlmError),

    #[error("store initialization failed")]
    StoreInit(#[source] StoreError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("Learning path not found")]
    NotFound,

    #[error("Unable to load learning path content.")]
    ContentLoad(#[source] StoreError),

    #[error("Error processing request.")]
    Upstream(#[source] TutorError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // startup-only, surfaced as 500 if they ever reach a handler
            AppError::LlmConfig(_) | AppError::StoreInit(_) => StatusCode::INTERNAL_SERVER_ERROR,

            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,

            AppError::ContentLoad(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,

            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::LlmConfig(_) => "LLM_CONFIG_ERROR",
            AppError::StoreInit(_) => "STORE_INIT_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound => "NOT_FOUND",
            AppError::ContentLoad(_) => "CONTENT_LOAD_ERROR",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
        }
    }
}

/// Failure body: `error` carries the human-readable message the caller
/// displays, `code` a stable machine-readable tag for log correlation.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(%status, err = %self, "request failed");
        let body = ErrorBody {
            error: self.to_string(),
            code: self.error_code(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Convert common Axum rejections to `AppError`.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// On the chat endpoint a store miss and a store failure are the same
/// caller-visible condition: the learning-path content could not be loaded.
/// Only the direct fetch routes distinguish a missing path as 404.
impl From<TutorError> for AppError {
    fn from(err: TutorError) -> Self {
        match err {
            TutorError::ContentLoad(source) => AppError::ContentLoad(source),
            upstream @ TutorError::UpstreamModel(_) => AppError::Upstream(upstream),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound,
            StoreError::InvalidId(id) => {
                AppError::BadRequest(format!("invalid learning path id: {id}"))
            }
            other => AppError::ContentLoad(other),
        }
    }
}
