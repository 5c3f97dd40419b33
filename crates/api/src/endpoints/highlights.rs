//! Story highlight endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use universe_common::AppResult;
use universe_core::{CreateHighlightInput, HighlightDetail};
use universe_db::entities::story_highlight;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Created, no_content},
};

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateHighlightInput>,
) -> AppResult<Created<HighlightDetail>> {
    let highlight = state.highlight_service.create(&user.id, input).await?;
    Ok(Created(highlight))
}

async fn by_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Vec<story_highlight::Model>>> {
    let highlights = state.highlight_service.list(&username).await?;
    Ok(ApiResponse::ok(highlights))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<HighlightDetail>> {
    let highlight = state.highlight_service.get(&id).await?;
    Ok(ApiResponse::ok(highlight))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.highlight_service.delete(&user.id, &id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/user/{username}", get(by_user))
        .route("/{id}", get(show).delete(delete))
}
