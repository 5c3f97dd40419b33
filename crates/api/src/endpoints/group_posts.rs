//! Group post endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Serialize;
use universe_common::AppResult;
use universe_core::{GroupCommentInput, GroupCommentView, LikeToggle};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Created, no_content},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinResponse {
    pub is_pinned: bool,
}

async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.group_post_service.delete_post(&user.id, &id).await?;
    Ok(no_content())
}

async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<LikeToggle>> {
    let toggled = state.group_post_service.toggle_like(&user.id, &id).await?;
    Ok(Json(toggled))
}

async fn comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<GroupCommentInput>,
) -> AppResult<Created<GroupCommentView>> {
    let comment = state
        .group_post_service
        .add_comment(&user.id, &id, input)
        .await?;
    Ok(Created(comment))
}

async fn comments(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<GroupCommentView>>> {
    let comments = state.group_post_service.list_comments(&user.id, &id).await?;
    Ok(ApiResponse::ok(comments))
}

/// Toggle the pinned flag.
async fn pin(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PinResponse>> {
    let is_pinned = state.group_post_service.pin_post(&user.id, &id).await?;
    Ok(ApiResponse::ok(PinResponse { is_pinned }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", delete(remove))
        .route("/{id}/like", post(like))
        .route("/{id}/comments", get(comments).post(comment))
        .route("/{id}/pin", post(pin))
}
