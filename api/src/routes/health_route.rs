//! GET /health — resilient model-backend probe.

use axum::{Json, extract::State};
use llm_service::health_service::HealthStatus;

use crate::core::app_state::AppState;

/// Handler: GET /health
///
/// Never fails; backend problems are reported as `ok: false` in the body.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.llm.health().await)
}
