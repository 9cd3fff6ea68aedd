//! POST /design_chat — handles one tutoring turn.

use axum::{Json, extract::State};
use tutoring::TurnRequest;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::chat::chat_request::{ChatRequest, ChatResponse},
};

/// Handler: POST /design_chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/design_chat \
///   -H 'content-type: application/json' \
///   -d '{"message":"hi","learning_path":"Whatsapp","is_first_response":true}'
/// ```
pub async fn design_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let outcome = state
        .tutor
        .run_turn(TurnRequest {
            message: body.message,
            learning_path: body.learning_path,
            session: body.context,
            is_first_response: body.is_first_response,
            scored: body.scored,
        })
        .await?;

    Ok(Json(ChatResponse::from_turn(outcome.reply, outcome.session)))
}
