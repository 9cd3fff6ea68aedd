//! HTTP surface of the tutoring backend.
//!
//! Thin axum layer over the `tutoring` crate: routing, request/response DTOs
//! and error mapping live here; turn semantics do not.

use std::env;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod core;
pub mod error_handler;
mod routes;

use crate::core::app_state::AppState;
use crate::error_handler::AppError;
use crate::routes::{
    chat::chat_route::design_chat,
    health_route::health,
    learning_paths::learning_paths_route::{get_learning_path, list_learning_paths},
};

/// Builds the application router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/design_chat", post(design_chat))
        .route("/learning-paths", get(list_learning_paths))
        .route("/learning-paths/{id}", get(get_learning_path))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Boots the server: state from env, bind, serve until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".into());

    let state = AppState::from_env().await?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(%host_url, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
}
