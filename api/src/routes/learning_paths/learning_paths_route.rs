//! GET /learning-paths and GET /learning-paths/{id}.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    core::app_state::AppState, error_handler::AppResult,
    routes::learning_paths::learning_path_response::LearningPathDoc,
};

/// Handler: GET /learning-paths
pub async fn list_learning_paths(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LearningPathDoc>>> {
    let paths = state.store.list_all().await?;
    Ok(Json(paths.into_iter().map(Into::into).collect()))
}

/// Handler: GET /learning-paths/{id}
pub async fn get_learning_path(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<LearningPathDoc>> {
    let path = state.store.find_by_id_str(&id).await?;
    Ok(Json(path.into()))
}
